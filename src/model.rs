//! Entity model for the redirection graph.
//!
//! Back-references (port → group, group → chain, hook → chain) are stored as ids
//! and resolved through [`crate::lookup`], never as owning pointers.

use serde::{Deserialize, Serialize};

use crate::errors::{RedirectionError, Result};

/// Addressable endpoint referenced by inspection ports and hooks.
///
/// Also used as the generic "element reference" for groups and chains passed
/// into the manager, where only `element_id` is meaningful.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkElement {
    pub element_id: Option<String>,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub mac_addresses: Vec<String>,
    #[serde(default)]
    pub port_ips: Vec<String>,
}

impl NetworkElement {
    pub fn with_id<T: Into<String>>(element_id: T) -> Self {
        Self {
            element_id: Some(element_id.into()),
            ..Self::default()
        }
    }

    pub fn with_addresses<T: Into<String>>(element_id: T, macs: &[&str], ips: &[&str]) -> Self {
        Self {
            element_id: Some(element_id.into()),
            parent_id: None,
            mac_addresses: macs.iter().map(|m| m.to_string()).collect(),
            port_ips: ips.iter().map(|ip| ip.to_string()).collect(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }
}

/// A port pair: the ingress/egress endpoints traffic is steered through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionPort {
    pub element_id: Option<String>,
    /// Id of the owning [`PortPairGroup`].
    pub parent_id: Option<String>,
    pub ingress: Option<NetworkElement>,
    pub egress: Option<NetworkElement>,
}

impl InspectionPort {
    pub fn new(ingress: NetworkElement, egress: NetworkElement) -> Self {
        Self {
            element_id: None,
            parent_id: None,
            ingress: Some(ingress),
            egress: Some(egress),
        }
    }

    pub fn by_id<T: Into<String>>(element_id: T) -> Self {
        Self {
            element_id: Some(element_id.into()),
            ..Self::default()
        }
    }

    pub fn with_parent<T: Into<String>>(mut self, parent_id: T) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn ingress_id(&self) -> Option<&str> {
        self.ingress.as_ref().and_then(NetworkElement::id)
    }

    pub fn egress_id(&self) -> Option<&str> {
        self.egress.as_ref().and_then(NetworkElement::id)
    }
}

/// One stage of a chain: a set of inspection ports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortPairGroup {
    pub element_id: String,
    /// Member port pair ids.
    pub port_pairs: Vec<String>,
    /// Id of the chain this group is bound to, if any.
    pub chain_id: Option<String>,
}

impl PortPairGroup {
    pub fn contains(&self, port_id: &str) -> bool {
        self.port_pairs.iter().any(|id| id == port_id)
    }
}

/// Ordered sequence of port pair groups. The order is the inspection path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceFunctionChain {
    pub element_id: String,
    pub port_pair_groups: Vec<String>,
    pub inspection_hooks: Vec<String>,
}

impl ServiceFunctionChain {
    pub fn contains_hook(&self, hook_id: &str) -> bool {
        self.inspection_hooks.iter().any(|id| id == hook_id)
    }
}

/// Binding of an inspected element to a service function chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InspectionHook {
    pub hook_id: Option<String>,
    pub inspected_port: Option<NetworkElement>,
    pub chain_id: Option<String>,
}

impl InspectionHook {
    pub fn new<T: Into<String>>(inspected_port: NetworkElement, chain_id: T) -> Self {
        Self {
            hook_id: None,
            inspected_port: Some(inspected_port),
            chain_id: Some(chain_id.into()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.hook_id.as_deref()
    }

    pub fn inspected_id(&self) -> Option<&str> {
        self.inspected_port.as_ref().and_then(NetworkElement::id)
    }

    /// The hook's inspection port is the chain it is attached to.
    pub fn inspection_port(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn tag(&self) -> Result<u64> {
        Err(RedirectionError::unsupported("Tags are not supported in neutron SFC."))
    }

    pub fn order(&self) -> Result<u64> {
        Err(RedirectionError::unsupported(
            "Hook order is not supported in neutron SFC.",
        ))
    }

    pub fn enc_type(&self) -> Result<TagEncapsulationType> {
        Err(RedirectionError::unsupported(
            "Tag encapsulation is not supported in neutron SFC.",
        ))
    }

    pub fn failure_policy(&self) -> Result<FailurePolicyType> {
        Err(RedirectionError::unsupported(
            "Failure policy is not supported in neutron SFC.",
        ))
    }
}

/// Accepted on hook install for interface compatibility only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagEncapsulationType {
    Vlan,
    Mpls,
    Vxlan,
    Gre,
}

/// Accepted on hook install for interface compatibility only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicyType {
    FailOpen,
    FailClose,
    NotApplicable,
}
