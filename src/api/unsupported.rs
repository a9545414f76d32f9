use tracing::error;

use super::RedirectionApi;
use crate::{
    backend::GraphStore,
    errors::{RedirectionError, Result},
    model::{FailurePolicyType, InspectionHook, NetworkElement},
};

fn not_supported<T>(message: String) -> Result<T> {
    error!("{message}");
    Err(RedirectionError::unsupported(message))
}

fn describe(element: Option<&NetworkElement>) -> &str {
    element.and_then(NetworkElement::id).unwrap_or("null")
}

/// Hook operations keyed only by ports, and the tag, order and failure-policy
/// accessors, are rejected.
impl<S: GraphStore> RedirectionApi<S> {
    pub fn get_inspection_hook_by_ports(
        &self,
        inspected: Option<&NetworkElement>,
        inspection_port: Option<&NetworkElement>,
    ) -> Result<Option<InspectionHook>> {
        not_supported(format!(
            "Retrieving inspection hooks with Inspected port: {} and Inspection port: {} is not supported.",
            describe(inspected),
            describe(inspection_port)
        ))
    }

    pub fn remove_inspection_hook_by_ports(
        &self,
        inspected: Option<&NetworkElement>,
        inspection_port: Option<&NetworkElement>,
    ) -> Result<()> {
        not_supported(format!(
            "Removing inspection hooks with Inspected port: {} and Inspection port: {} is not supported.",
            describe(inspected),
            describe(inspection_port)
        ))
    }

    pub fn remove_all_inspection_hooks(&self, _inspected: Option<&NetworkElement>) -> Result<()> {
        not_supported("Removing all inspection hooks is not supported in neutron SFC.".to_string())
    }

    pub fn get_inspection_hook_tag(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
    ) -> Result<u64> {
        not_supported("Tags are not supported in neutron SFC.".to_string())
    }

    pub fn set_inspection_hook_tag(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
        _tag: u64,
    ) -> Result<()> {
        not_supported("Tags are not supported in neutron SFC.".to_string())
    }

    pub fn get_inspection_hook_failure_policy(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
    ) -> Result<FailurePolicyType> {
        not_supported("Failure policy is not supported in neutron SFC.".to_string())
    }

    pub fn set_inspection_hook_failure_policy(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
        _policy: FailurePolicyType,
    ) -> Result<()> {
        not_supported("Failure policy is not supported in neutron SFC.".to_string())
    }

    pub fn get_inspection_hook_order(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
    ) -> Result<u64> {
        not_supported("Hook order is not supported in neutron SFC.".to_string())
    }

    pub fn set_inspection_hook_order(
        &self,
        _inspected: Option<&NetworkElement>,
        _inspection_port: Option<&NetworkElement>,
        _order: u64,
    ) -> Result<()> {
        not_supported("Hook order is not supported in neutron SFC.".to_string())
    }

    pub fn get_network_element_by_device_owner_id(
        &self,
        _device_owner_id: &str,
    ) -> Result<Option<NetworkElement>> {
        not_supported(
            "Retrieving the network element given the device owner id is currently not supported."
                .to_string(),
        )
    }
}
