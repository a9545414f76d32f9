use ahash::AHashSet;
use tracing::{debug, warn};

use super::RedirectionApi;
use crate::{
    backend::GraphStore,
    errors::Result,
    lookup::{reject_conflict, require_found, require_id, require_non_empty, require_present},
    model::{NetworkElement, PortPairGroup, ServiceFunctionChain},
};

impl<S: GraphStore> RedirectionApi<S> {
    /// Creates a chain over `groups`, in the given order.
    pub fn register_network_element(&self, groups: &[NetworkElement]) -> Result<ServiceFunctionChain> {
        require_non_empty(groups, "Port Pair Group member list")?;
        let group_ids = collect_group_ids(groups)?;

        self.store().required(|| {
            self.validate_groups(&group_ids, None)?;
            let chain = self.store().create_chain(&group_ids)?;
            debug!(chain = %chain.element_id, groups = group_ids.len(), "registered service function chain");
            Ok(chain)
        })
    }

    /// Replaces the chain's groups with `groups`, in the given order. Groups
    /// already on this chain may be listed again.
    pub fn update_network_element(
        &self,
        chain: Option<&NetworkElement>,
        groups: &[NetworkElement],
    ) -> Result<ServiceFunctionChain> {
        let chain_ref = require_present(chain, "Service Function Chain Id")?;
        let chain_id = require_id(chain_ref.id(), "Service Function Chain Id")?;
        require_non_empty(groups, "Port Pair Group update member list")?;
        let group_ids = collect_group_ids(groups)?;

        self.store().required(|| {
            let mut chain = require_found(
                self.lookup().find_chain(chain_id)?,
                "Service Function Chain",
                chain_id,
            )?;
            self.validate_groups(&group_ids, Some(chain_id))?;
            chain.port_pair_groups = group_ids.clone();
            self.store().update_chain(&chain)
        })
    }

    /// Deletes the chain. Its groups survive, unbound.
    pub fn delete_network_element(&self, chain: Option<&NetworkElement>) -> Result<()> {
        let chain_ref = require_present(chain, "Service Function Chain Id")?;
        let chain_id = require_id(chain_ref.id(), "Service Function Chain Id")?;

        self.store().required(|| {
            let mut chain = require_found(
                self.lookup().find_chain(chain_id)?,
                "Service Function Chain",
                chain_id,
            )?;
            if !chain.inspection_hooks.is_empty() {
                return Err(reject_conflict(format!(
                    "Service Function Chain {chain_id} still has {} inspection hook(s)",
                    chain.inspection_hooks.len()
                )));
            }
            if !chain.port_pair_groups.is_empty() {
                chain.port_pair_groups.clear();
                self.store().update_chain(&chain)?;
            }
            self.store().delete_chain(chain_id)
        })
    }

    /// Groups of the chain in chain order.
    pub fn get_network_elements(&self, chain: Option<&NetworkElement>) -> Result<Vec<PortPairGroup>> {
        let chain_ref = require_present(chain, "Service Function Chain Id")?;
        let chain_id = require_id(chain_ref.id(), "Service Function Chain Id")?;
        let lookup = self.lookup();
        let chain = require_found(lookup.find_chain(chain_id)?, "Service Function Chain", chain_id)?;

        let mut groups = Vec::with_capacity(chain.port_pair_groups.len());
        for group_id in chain.port_pair_groups {
            match lookup.find_group(&group_id)? {
                Some(group) => groups.push(group),
                None => {
                    warn!(chain = %chain_id, group = %group_id, "chain references a missing port pair group");
                    groups.push(PortPairGroup {
                        element_id: group_id,
                        port_pairs: Vec::new(),
                        chain_id: Some(chain_id.to_string()),
                    });
                }
            }
        }
        Ok(groups)
    }

    /// Every group must exist, appear once, and be unbound or bound to `chain_id`.
    fn validate_groups(&self, group_ids: &[String], chain_id: Option<&str>) -> Result<()> {
        let lookup = self.lookup();
        let mut seen = AHashSet::with_capacity(group_ids.len());
        for group_id in group_ids {
            if !seen.insert(group_id.as_str()) {
                return Err(reject_conflict(format!(
                    "Port Pair Group Id {group_id} is listed more than once"
                )));
            }
            require_found(lookup.find_group(group_id)?, "Port Pair Group", group_id)?;
            if let Some(bound) = lookup.find_chain_containing_group(group_id)?
                && Some(bound.element_id.as_str()) != chain_id
            {
                return Err(reject_conflict(format!(
                    "Port Pair Group Id {group_id} is already chained to SFC Id : {}",
                    bound.element_id
                )));
            }
        }
        Ok(())
    }
}

fn collect_group_ids(groups: &[NetworkElement]) -> Result<Vec<String>> {
    groups
        .iter()
        .map(|group| require_id(group.id(), "Port Pair Group Id").map(str::to_string))
        .collect()
}
