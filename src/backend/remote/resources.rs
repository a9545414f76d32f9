//! Wire documents of the remote SFC API.
//!
//! Collections may come back missing or `null`; they deserialize as empty.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::errors::ResourceKind;

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// Copy with the attributes the API refuses to modify cleared.
    fn for_update(&self) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortPairResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress: Option<String>,
}

impl Resource for PortPairResource {
    const KIND: ResourceKind = ResourceKind::PortPair;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn for_update(&self) -> Self {
        Self {
            id: None,
            project_id: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortPairGroupResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub port_pairs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_pair_group_parameters: Option<Map<String, Value>>,
}

impl Resource for PortPairGroupResource {
    const KIND: ResourceKind = ResourceKind::PortPairGroup;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn for_update(&self) -> Self {
        Self {
            id: None,
            project_id: None,
            port_pair_group_parameters: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortChainResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub port_pair_groups: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flow_classifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_parameters: Option<Map<String, Value>>,
}

impl Resource for PortChainResource {
    const KIND: ResourceKind = ResourceKind::PortChain;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn for_update(&self) -> Self {
        Self {
            id: None,
            project_id: None,
            chain_id: None,
            chain_parameters: None,
            ..self.clone()
        }
    }
}

/// A flow classifier stands in for an inspection hook; its destination port is
/// the inspected element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowClassifierResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_destination_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_source_port: Option<String>,
}

impl Resource for FlowClassifierResource {
    const KIND: ResourceKind = ResourceKind::FlowClassifier;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn for_update(&self) -> Self {
        Self {
            id: None,
            project_id: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_collections_deserialize_empty() {
        let chain: PortChainResource = serde_json::from_str(
            r#"{ "id": "c", "port_pair_groups": null }"#,
        )
        .expect("chain");
        assert!(chain.port_pair_groups.is_empty());
        assert!(chain.flow_classifiers.is_empty());
    }

    #[test]
    fn test_update_copy_drops_immutable_attributes() {
        let chain = PortChainResource {
            id: Some("c".into()),
            project_id: Some("p".into()),
            chain_id: Some(7),
            port_pair_groups: vec!["g".into()],
            ..PortChainResource::default()
        };
        let update = chain.for_update();
        assert!(update.id.is_none());
        assert!(update.chain_id.is_none());
        assert_eq!(update.port_pair_groups, vec!["g".to_string()]);
        let json = serde_json::to_value(&update).expect("json");
        assert!(json.get("id").is_none());
    }
}
