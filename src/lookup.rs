//! Read-side relationship queries and input validation.
//!
//! Lookups never fail for "not found"; they return `None`. Where at most one
//! match is expected and several come back, read paths log and keep the first
//! one, except [`RedirectionLookup::find_hook_by_inspected_and_chain`], which
//! guards hook uniqueness and refuses to pick.

use tracing::{error, warn};

use crate::{
    backend::GraphStore,
    errors::{RedirectionError, Result},
    model::{InspectionHook, InspectionPort, NetworkElement, PortPairGroup, ServiceFunctionChain},
};

pub struct RedirectionLookup<'a, S: GraphStore> {
    store: &'a S,
}

impl<'a, S: GraphStore> RedirectionLookup<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Port whose ingress and egress ids equal those of the given elements. An
    /// absent element and an element without id compare equal.
    ///
    /// Full scan of the port pairs in the remote regime.
    pub fn find_pair_by_endpoints(
        &self,
        ingress: Option<&NetworkElement>,
        egress: Option<&NetworkElement>,
    ) -> Result<Option<InspectionPort>> {
        let ingress_id = ingress.and_then(NetworkElement::id);
        let egress_id = egress.and_then(NetworkElement::id);
        let matches = self.store.ports_by_endpoints(ingress_id, egress_id)?;
        if matches.len() > 1 {
            warn!(
                ingress = ?ingress_id,
                egress = ?egress_id,
                count = matches.len(),
                "multiple inspection ports share the same endpoints, using the first"
            );
        }
        Ok(matches.into_iter().next())
    }

    /// By id first; on a miss, or without an id, by endpoints.
    pub fn find_pair_by_id(&self, port: &InspectionPort) -> Result<Option<InspectionPort>> {
        if let Some(id) = port.id() {
            if let Some(found) = self.store.get_port(id)? {
                return Ok(Some(found));
            }
            warn!(port_id = %id, "inspection port not found by id, trying its endpoints");
        }
        self.find_pair_by_endpoints(port.ingress.as_ref(), port.egress.as_ref())
    }

    pub fn find_group_containing_pair(&self, pair_id: &str) -> Result<Option<PortPairGroup>> {
        let groups = self.store.groups_containing_port(pair_id)?;
        Ok(first_of(groups, "port pair groups containing port pair", pair_id))
    }

    pub fn find_chain_containing_group(
        &self,
        group_id: &str,
    ) -> Result<Option<ServiceFunctionChain>> {
        let chains = self.store.chains_containing_group(group_id)?;
        Ok(first_of(chains, "service function chains containing group", group_id))
    }

    pub fn find_chain_containing_hook(
        &self,
        hook_id: &str,
    ) -> Result<Option<ServiceFunctionChain>> {
        let chains = self.store.chains_containing_hook(hook_id)?;
        Ok(first_of(chains, "service function chains containing hook", hook_id))
    }

    /// At most one hook may bind an inspected element to a chain; more than one
    /// match is an error.
    pub fn find_hook_by_inspected_and_chain(
        &self,
        inspected_id: &str,
        chain_id: &str,
    ) -> Result<Option<InspectionHook>> {
        let mut hooks = self.store.hooks_by_inspected_and_chain(inspected_id, chain_id)?;
        if hooks.len() > 1 {
            return Err(reject_conflict(format!(
                "Multiple results! Inspection hooks by inspected {inspected_id} and sfc {chain_id}"
            )));
        }
        Ok(hooks.pop())
    }

    pub fn find_group(&self, group_id: &str) -> Result<Option<PortPairGroup>> {
        self.store.get_group(group_id)
    }

    pub fn find_chain(&self, chain_id: &str) -> Result<Option<ServiceFunctionChain>> {
        self.store.get_chain(chain_id)
    }

    pub fn find_hook(&self, hook_id: &str) -> Result<Option<InspectionHook>> {
        self.store.get_hook(hook_id)
    }
}

fn first_of<T>(items: Vec<T>, what: &str, key: &str) -> Option<T> {
    if items.len() > 1 {
        warn!(key = %key, count = items.len(), "multiple {what}, using the first");
    }
    items.into_iter().next()
}

pub fn require_non_empty<T>(items: &[T], label: &str) -> Result<()> {
    if items.is_empty() {
        error!(label = %label, "empty list passed");
        return Err(RedirectionError::invalid_input(label));
    }
    Ok(())
}

pub fn require_present<'v, T>(value: Option<&'v T>, label: &str) -> Result<&'v T> {
    value.ok_or_else(|| {
        error!(label = %label, "missing value passed");
        RedirectionError::invalid_input(label)
    })
}

/// Empty ids count as missing.
pub fn require_id<'v>(id: Option<&'v str>, label: &str) -> Result<&'v str> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => {
            error!(label = %label, "missing id passed");
            Err(RedirectionError::invalid_input(label))
        }
    }
}

pub fn require_found<T>(value: Option<T>, label: &str, id: &str) -> Result<T> {
    value.ok_or_else(|| {
        let err = RedirectionError::not_found(label, id);
        error!(label = %label, id = %id, "{err}");
        err
    })
}

pub(crate) fn reject_conflict(message: String) -> RedirectionError {
    error!("{message}");
    RedirectionError::conflict(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = require_non_empty::<String>(&[], "Port Pair Group member list").unwrap_err();
        assert_eq!(err.to_string(), "null passed for Port Pair Group member list !");

        let err = require_id(Some(""), "Inspected port").unwrap_err();
        assert_eq!(err.to_string(), "null passed for Inspected port !");
        assert_eq!(require_id(Some("x"), "Inspected port").expect("id"), "x");

        let missing: Option<&NetworkElement> = None;
        assert!(require_present(missing, "ingress element").is_err());

        let err = require_found::<PortPairGroup>(None, "Port Pair Group", "g-1").unwrap_err();
        assert_eq!(err.to_string(), "Cannot find Port Pair Group by id: g-1!");
    }

    #[test]
    fn test_first_of_keeps_first_match() {
        assert_eq!(first_of(vec![1, 2], "numbers", "k"), Some(1));
        assert_eq!(first_of(Vec::<i32>::new(), "numbers", "k"), None);
    }
}
