use tracing::{debug, warn};

use super::RedirectionApi;
use crate::{
    backend::GraphStore,
    errors::Result,
    lookup::{require_found, require_id, require_present},
    model::{InspectionPort, PortPairGroup},
};

impl<S: GraphStore> RedirectionApi<S> {
    /// Stored port for `port`, resolved by id and then by endpoints.
    pub fn get_inspection_port(&self, port: Option<&InspectionPort>) -> Result<Option<InspectionPort>> {
        let Some(port) = port else {
            warn!("no inspection port given to look up");
            return Ok(None);
        };
        self.lookup().find_pair_by_id(port)
    }

    /// Registers the ingress/egress pair and places it in a group.
    ///
    /// With a `parent_id` the port joins that group, leaving its previous one.
    /// Without one the port keeps the group it already has, or gets a fresh
    /// group of its own.
    pub fn register_inspection_port(&self, port: Option<&InspectionPort>) -> Result<InspectionPort> {
        let port = require_present(port, "Inspection Port")?;
        let ingress = require_present(port.ingress.as_ref(), "ingress element")?;
        let egress = require_present(port.egress.as_ref(), "egress element")?;

        self.store().required(|| {
            let lookup = self.lookup();
            let target = match port.parent_id.as_deref().filter(|id| !id.is_empty()) {
                Some(group_id) => Some(require_found(
                    lookup.find_group(group_id)?,
                    "Port Pair Group",
                    group_id,
                )?),
                None => None,
            };

            let pair = match lookup.find_pair_by_endpoints(Some(ingress), Some(egress))? {
                Some(existing) => existing,
                None => self.store().create_port(ingress, egress)?,
            };
            let pair_id = require_id(pair.id(), "Inspection Port")?;

            let parent_id = match target {
                Some(mut group) => {
                    if let Some(previous) = pair
                        .parent_id
                        .as_deref()
                        .filter(|previous| *previous != group.element_id)
                    {
                        if let Some(previous) = lookup.find_group(previous)? {
                            self.release_from_group(previous, pair_id)?;
                        }
                    }
                    if !group.contains(pair_id) {
                        group.port_pairs.push(pair_id.to_string());
                        self.store().update_group(&group)?;
                    }
                    group.element_id
                }
                None => match pair.parent_id.clone() {
                    Some(existing) => existing,
                    None => self.store().create_group(&[pair_id.to_string()])?.element_id,
                },
            };
            debug!(port_id = %pair_id, group_id = %parent_id, "registered inspection port");

            Ok(InspectionPort {
                element_id: Some(pair_id.to_string()),
                parent_id: Some(parent_id),
                ingress: Some(ingress.clone()),
                egress: Some(egress.clone()),
            })
        })
    }

    /// Removes the port and, with it, a group left empty. Removing an absent
    /// port is not an error.
    pub fn remove_inspection_port(&self, port: Option<&InspectionPort>) -> Result<()> {
        let Some(port) = port else {
            warn!("no inspection port given to remove");
            return Ok(());
        };
        self.store().required(|| {
            let lookup = self.lookup();
            let Some(pair) = lookup.find_pair_by_id(port)? else {
                warn!(port_id = ?port.id(), "inspection port not found, nothing to remove");
                return Ok(());
            };
            let pair_id = require_id(pair.id(), "Inspection Port")?;
            if let Some(group) = lookup.find_group_containing_pair(pair_id)? {
                self.release_from_group(group, pair_id)?;
            }
            self.store().delete_port(pair_id)
        })
    }

    /// Drops `pair_id` from `group`; an emptied group is unbound from its
    /// chain and deleted.
    pub(super) fn release_from_group(&self, mut group: PortPairGroup, pair_id: &str) -> Result<()> {
        group.port_pairs.retain(|id| id != pair_id);
        if !group.port_pairs.is_empty() {
            return self.store().update_group(&group).map(|_| ());
        }
        if let Some(mut chain) = self.lookup().find_chain_containing_group(&group.element_id)? {
            chain.port_pair_groups.retain(|id| *id != group.element_id);
            self.store().update_chain(&chain)?;
        }
        debug!(group_id = %group.element_id, "deleting emptied port pair group");
        self.store().delete_group(&group.element_id)
    }
}
