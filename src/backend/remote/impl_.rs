use serde_json::Map;
use tracing::{debug, warn};

use super::{
    client::{DeleteOutcome, SfcClient},
    resources::{
        FlowClassifierResource, PortChainResource, PortPairGroupResource, PortPairResource,
        Resource,
    },
};
use crate::{
    backend::GraphStore,
    config::RemoteConfig,
    errors::{Operation, RedirectionError, Result},
    model::{InspectionHook, InspectionPort, NetworkElement, PortPairGroup, ServiceFunctionChain},
};

/// Store backed by the remote SFC API.
///
/// Each call is its own commit. Back-references are not stored remotely, so
/// `parent_id`, `chain_id` and hook chains are derived by scanning the lists.
pub struct RemoteGraphStore<C: SfcClient> {
    client: Option<C>,
    config: RemoteConfig,
}

impl<C: SfcClient> RemoteGraphStore<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, RemoteConfig::default())
    }

    pub fn with_config(client: C, config: RemoteConfig) -> Self {
        Self {
            client: Some(client),
            config,
        }
    }

    pub fn client(&self) -> Result<&C> {
        self.client
            .as_ref()
            .ok_or_else(|| RedirectionError::connection("remote session is closed"))
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    fn create<R: Resource>(&self, resource: &R) -> Result<R> {
        let created = self
            .client()?
            .create(resource)
            .map_err(|e| RedirectionError::backend(Operation::Create, R::KIND, e))?;
        let Some(id) = created.id() else {
            return Err(RedirectionError::backend(
                Operation::Create,
                R::KIND,
                "create returned no id",
            ));
        };
        debug!(kind = %R::KIND, id = %id, "created remote resource");
        Ok(created)
    }

    fn fetch<R: Resource>(&self, id: &str) -> Result<Option<R>> {
        self.client()?
            .get(id)
            .map_err(|e| RedirectionError::backend(Operation::Get, R::KIND, e))
    }

    fn modify<R: Resource>(&self, id: &str, resource: &R) -> Result<R> {
        let updated = self
            .client()?
            .update(id, &resource.for_update())
            .map_err(|e| RedirectionError::backend(Operation::Update, R::KIND, e))?;
        debug!(kind = %R::KIND, id = %id, "updated remote resource");
        Ok(updated)
    }

    fn remove<R: Resource>(&self, id: &str) -> Result<()> {
        let outcome = self
            .client()?
            .delete::<R>(id)
            .map_err(|e| RedirectionError::backend(Operation::Delete, R::KIND, e))?;
        match outcome {
            DeleteOutcome::Deleted => debug!(kind = %R::KIND, id = %id, "deleted remote resource"),
            DeleteOutcome::NotFound => {
                warn!(kind = %R::KIND, id = %id, "remote resource already gone, treating delete as done")
            }
        }
        Ok(())
    }

    fn list_all<R: Resource>(&self) -> Result<Vec<R>> {
        self.client()?
            .list()
            .map_err(|e| RedirectionError::backend(Operation::List, R::KIND, e))
    }

    fn port_from(pair: PortPairResource, groups: &[PortPairGroupResource]) -> InspectionPort {
        let parent_id = pair.id.as_deref().and_then(|id| {
            groups
                .iter()
                .find(|g| g.port_pairs.iter().any(|p| p == id))
                .and_then(|g| g.id.clone())
        });
        InspectionPort {
            element_id: pair.id,
            parent_id,
            ingress: pair.ingress.map(NetworkElement::with_id),
            egress: pair.egress.map(NetworkElement::with_id),
        }
    }

    fn group_from(group: PortPairGroupResource, chains: &[PortChainResource]) -> PortPairGroup {
        let element_id = group.id.unwrap_or_default();
        let chain_id = chains
            .iter()
            .find(|c| c.port_pair_groups.contains(&element_id))
            .and_then(|c| c.id.clone());
        PortPairGroup {
            element_id,
            port_pairs: group.port_pairs,
            chain_id,
        }
    }

    fn chain_from(chain: PortChainResource) -> ServiceFunctionChain {
        ServiceFunctionChain {
            element_id: chain.id.unwrap_or_default(),
            port_pair_groups: chain.port_pair_groups,
            inspection_hooks: chain.flow_classifiers,
        }
    }

    fn hook_from(classifier: FlowClassifierResource, chains: &[PortChainResource]) -> InspectionHook {
        let chain_id = classifier.id.as_deref().and_then(|id| {
            chains
                .iter()
                .find(|c| c.flow_classifiers.iter().any(|fc| fc == id))
                .and_then(|c| c.id.clone())
        });
        InspectionHook {
            hook_id: classifier.id,
            inspected_port: classifier.logical_destination_port.map(NetworkElement::with_id),
            chain_id,
        }
    }

    fn require_chain(&self, chain_id: &str) -> Result<PortChainResource> {
        self.fetch::<PortChainResource>(chain_id)?
            .ok_or_else(|| RedirectionError::not_found("Service Function Chain", chain_id))
    }

    fn chains_with_classifier(&self, classifier_id: &str) -> Result<Vec<PortChainResource>> {
        Ok(self
            .list_all::<PortChainResource>()?
            .into_iter()
            .filter(|c| c.flow_classifiers.iter().any(|fc| fc == classifier_id))
            .collect())
    }

    fn attach_classifier(&self, mut chain: PortChainResource, classifier_id: &str) -> Result<()> {
        let chain_id = chain.id.clone().unwrap_or_default();
        if !chain.flow_classifiers.iter().any(|fc| fc == classifier_id) {
            chain.flow_classifiers.push(classifier_id.to_string());
        }
        self.modify(&chain_id, &chain).map(|_| ())
    }

    fn detach_classifier(&self, mut chain: PortChainResource, classifier_id: &str) -> Result<()> {
        let chain_id = chain.id.clone().unwrap_or_default();
        chain.flow_classifiers.retain(|fc| fc != classifier_id);
        self.modify(&chain_id, &chain).map(|_| ())
    }
}

impl<C: SfcClient> GraphStore for RemoteGraphStore<C> {
    fn required<R, F>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        work()
    }

    fn get_port(&self, id: &str) -> Result<Option<InspectionPort>> {
        let Some(pair) = self.fetch::<PortPairResource>(id)? else {
            return Ok(None);
        };
        let groups = self.list_all::<PortPairGroupResource>()?;
        Ok(Some(Self::port_from(pair, &groups)))
    }

    fn list_ports(&self) -> Result<Vec<InspectionPort>> {
        let pairs = self.list_all::<PortPairResource>()?;
        let groups = self.list_all::<PortPairGroupResource>()?;
        Ok(pairs
            .into_iter()
            .map(|pair| Self::port_from(pair, &groups))
            .collect())
    }

    fn create_port(
        &self,
        ingress: &NetworkElement,
        egress: &NetworkElement,
    ) -> Result<InspectionPort> {
        let created = self.create(&PortPairResource {
            name: Some(self.config.resource_name("PortPair")),
            description: Some(self.config.description("Port Pair")),
            ingress: ingress.element_id.clone(),
            egress: egress.element_id.clone(),
            ..PortPairResource::default()
        })?;
        Ok(InspectionPort {
            element_id: created.id,
            parent_id: None,
            ingress: Some(ingress.clone()),
            egress: Some(egress.clone()),
        })
    }

    fn delete_port(&self, id: &str) -> Result<()> {
        self.remove::<PortPairResource>(id)
    }

    fn get_group(&self, id: &str) -> Result<Option<PortPairGroup>> {
        let Some(group) = self.fetch::<PortPairGroupResource>(id)? else {
            return Ok(None);
        };
        let chains = self.list_all::<PortChainResource>()?;
        Ok(Some(Self::group_from(group, &chains)))
    }

    fn list_groups(&self) -> Result<Vec<PortPairGroup>> {
        let groups = self.list_all::<PortPairGroupResource>()?;
        let chains = self.list_all::<PortChainResource>()?;
        Ok(groups
            .into_iter()
            .map(|group| Self::group_from(group, &chains))
            .collect())
    }

    fn create_group(&self, port_pairs: &[String]) -> Result<PortPairGroup> {
        let created = self.create(&PortPairGroupResource {
            name: Some(self.config.resource_name("PortPairGroup")),
            description: Some(self.config.description("Port Pair Group")),
            port_pairs: port_pairs.to_vec(),
            ..PortPairGroupResource::default()
        })?;
        Ok(Self::group_from(created, &[]))
    }

    fn update_group(&self, group: &PortPairGroup) -> Result<PortPairGroup> {
        let updated = self.modify(
            &group.element_id,
            &PortPairGroupResource {
                port_pairs: group.port_pairs.clone(),
                ..PortPairGroupResource::default()
            },
        )?;
        let chains = self.list_all::<PortChainResource>()?;
        Ok(Self::group_from(updated, &chains))
    }

    fn delete_group(&self, id: &str) -> Result<()> {
        self.remove::<PortPairGroupResource>(id)
    }

    fn get_chain(&self, id: &str) -> Result<Option<ServiceFunctionChain>> {
        Ok(self.fetch::<PortChainResource>(id)?.map(Self::chain_from))
    }

    fn list_chains(&self) -> Result<Vec<ServiceFunctionChain>> {
        Ok(self
            .list_all::<PortChainResource>()?
            .into_iter()
            .map(Self::chain_from)
            .collect())
    }

    fn create_chain(&self, port_pair_groups: &[String]) -> Result<ServiceFunctionChain> {
        let created = self.create(&PortChainResource {
            name: Some(self.config.resource_name("PortChain")),
            description: Some(self.config.description("Port Chain object")),
            port_pair_groups: port_pair_groups.to_vec(),
            flow_classifiers: Vec::new(),
            chain_parameters: Some(Map::new()),
            ..PortChainResource::default()
        })?;
        Ok(Self::chain_from(created))
    }

    fn update_chain(&self, chain: &ServiceFunctionChain) -> Result<ServiceFunctionChain> {
        let mut stored = self.require_chain(&chain.element_id)?;
        stored.port_pair_groups = chain.port_pair_groups.clone();
        let updated = self.modify(&chain.element_id, &stored)?;
        Ok(Self::chain_from(updated))
    }

    fn delete_chain(&self, id: &str) -> Result<()> {
        self.remove::<PortChainResource>(id)
    }

    fn get_hook(&self, id: &str) -> Result<Option<InspectionHook>> {
        let Some(classifier) = self.fetch::<FlowClassifierResource>(id)? else {
            return Ok(None);
        };
        let chains = self.chains_with_classifier(id)?;
        Ok(Some(Self::hook_from(classifier, &chains)))
    }

    fn list_hooks(&self) -> Result<Vec<InspectionHook>> {
        let classifiers = self.list_all::<FlowClassifierResource>()?;
        let chains = self.list_all::<PortChainResource>()?;
        Ok(classifiers
            .into_iter()
            .map(|fc| Self::hook_from(fc, &chains))
            .collect())
    }

    fn create_hook(&self, inspected: &NetworkElement, chain_id: &str) -> Result<InspectionHook> {
        let chain = self.require_chain(chain_id)?;
        let classifier = self.create(&FlowClassifierResource {
            name: Some(self.config.resource_name("FlowClassifier")),
            description: Some(self.config.description("Flow Classifier")),
            logical_destination_port: inspected.element_id.clone(),
            ..FlowClassifierResource::default()
        })?;
        let classifier_id = classifier.id.clone().unwrap_or_default();
        if let Err(err) = self.attach_classifier(chain, &classifier_id) {
            warn!(hook = %classifier_id, chain = %chain_id, error = %err, "attaching flow classifier failed, deleting it");
            if let Err(cleanup) = self.remove::<FlowClassifierResource>(&classifier_id) {
                warn!(hook = %classifier_id, error = %cleanup, "orphan flow classifier left behind");
            }
            return Err(err);
        }
        Ok(InspectionHook {
            hook_id: Some(classifier_id),
            inspected_port: Some(inspected.clone()),
            chain_id: Some(chain_id.to_string()),
        })
    }

    fn update_hook_chain(&self, hook_id: &str, chain_id: &str) -> Result<InspectionHook> {
        let classifier = self
            .fetch::<FlowClassifierResource>(hook_id)?
            .ok_or_else(|| RedirectionError::not_found("Inspection Hook", hook_id))?;
        let target = self.require_chain(chain_id)?;
        let current = self.chains_with_classifier(hook_id)?;

        let mut detached = Vec::new();
        for chain in current {
            if chain.id.as_deref() == Some(chain_id) {
                continue;
            }
            let snapshot = chain.clone();
            self.detach_classifier(chain, hook_id)?;
            detached.push(snapshot);
        }

        if let Err(err) = self.attach_classifier(target, hook_id) {
            warn!(hook = %hook_id, chain = %chain_id, error = %err, "attaching hook to new chain failed, restoring previous chain");
            for chain in detached {
                let previous = chain.id.clone().unwrap_or_default();
                if let Err(restore) = self
                    .fetch::<PortChainResource>(&previous)
                    .and_then(|latest| match latest {
                        Some(latest) => self.attach_classifier(latest, hook_id),
                        None => Ok(()),
                    })
                {
                    warn!(hook = %hook_id, chain = %previous, error = %restore, "hook left detached from every chain");
                }
            }
            return Err(err);
        }

        let mut hook = Self::hook_from(classifier, &[]);
        hook.chain_id = Some(chain_id.to_string());
        Ok(hook)
    }

    fn delete_hook(&self, id: &str) -> Result<()> {
        if self.fetch::<FlowClassifierResource>(id)?.is_none() {
            warn!(hook = %id, "inspection hook not found, nothing to delete");
            return Ok(());
        }
        for chain in self.chains_with_classifier(id)? {
            self.detach_classifier(chain, id)?;
        }
        self.remove::<FlowClassifierResource>(id)
    }

    fn ports_by_endpoints(
        &self,
        ingress_id: Option<&str>,
        egress_id: Option<&str>,
    ) -> Result<Vec<InspectionPort>> {
        let matching: Vec<PortPairResource> = self
            .list_all::<PortPairResource>()?
            .into_iter()
            .filter(|p| p.ingress.as_deref() == ingress_id && p.egress.as_deref() == egress_id)
            .collect();
        if matching.is_empty() {
            return Ok(Vec::new());
        }
        let groups = self.list_all::<PortPairGroupResource>()?;
        Ok(matching
            .into_iter()
            .map(|pair| Self::port_from(pair, &groups))
            .collect())
    }

    fn groups_containing_port(&self, port_id: &str) -> Result<Vec<PortPairGroup>> {
        let matching: Vec<PortPairGroupResource> = self
            .list_all::<PortPairGroupResource>()?
            .into_iter()
            .filter(|g| g.port_pairs.iter().any(|p| p == port_id))
            .collect();
        if matching.is_empty() {
            return Ok(Vec::new());
        }
        let chains = self.list_all::<PortChainResource>()?;
        Ok(matching
            .into_iter()
            .map(|group| Self::group_from(group, &chains))
            .collect())
    }

    fn chains_containing_group(&self, group_id: &str) -> Result<Vec<ServiceFunctionChain>> {
        Ok(self
            .list_all::<PortChainResource>()?
            .into_iter()
            .filter(|c| c.port_pair_groups.iter().any(|g| g == group_id))
            .map(Self::chain_from)
            .collect())
    }

    fn chains_containing_hook(&self, hook_id: &str) -> Result<Vec<ServiceFunctionChain>> {
        Ok(self
            .chains_with_classifier(hook_id)?
            .into_iter()
            .map(Self::chain_from)
            .collect())
    }

    fn hooks_by_inspected_and_chain(
        &self,
        inspected_id: &str,
        chain_id: &str,
    ) -> Result<Vec<InspectionHook>> {
        let Some(chain) = self.fetch::<PortChainResource>(chain_id)? else {
            return Ok(Vec::new());
        };
        let mut hooks = Vec::new();
        for classifier_id in &chain.flow_classifiers {
            let Some(classifier) = self.fetch::<FlowClassifierResource>(classifier_id)? else {
                continue;
            };
            if classifier.logical_destination_port.as_deref() == Some(inspected_id) {
                let mut hook = Self::hook_from(classifier, &[]);
                hook.chain_id = Some(chain_id.to_string());
                hooks.push(hook);
            }
        }
        Ok(hooks)
    }

    fn close(&mut self) -> Result<()> {
        if self.client.take().is_some() {
            debug!("remote session closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::remote::{client::ClientError, memory::InMemorySfcClient},
        errors::ResourceKind,
    };

    fn sample_chain(store: &RemoteGraphStore<&InMemorySfcClient>) -> String {
        store.create_chain(&[]).expect("chain").element_id
    }

    #[test]
    fn test_generated_names_follow_prefix() {
        let client = InMemorySfcClient::new();
        let store = RemoteGraphStore::new(&client);
        let port = store
            .create_port(&NetworkElement::with_id("in"), &NetworkElement::with_id("out"))
            .expect("port");
        let pair: PortPairResource = client
            .get(port.id().expect("id"))
            .expect("get")
            .expect("pair");
        assert!(pair.name.expect("name").starts_with("OSCPortPair-"));
        assert_eq!(pair.description.as_deref(), Some("Port Pair created by OSC"));
    }

    #[test]
    fn test_failed_attach_deletes_new_classifier() {
        let client = InMemorySfcClient::new();
        let store = RemoteGraphStore::new(&client);
        let chain = sample_chain(&store);
        client.fail_next(
            ResourceKind::PortChain,
            Operation::Update,
            1,
            ClientError::status(500, "boom"),
        );
        let err = store
            .create_hook(&NetworkElement::with_id("vm"), &chain)
            .unwrap_err();
        assert!(matches!(err, RedirectionError::Backend { .. }));
        assert_eq!(client.count(ResourceKind::FlowClassifier), 0);
    }

    #[test]
    fn test_failed_move_restores_previous_chain() {
        let client = InMemorySfcClient::new();
        let store = RemoteGraphStore::new(&client);
        let first = sample_chain(&store);
        let second = sample_chain(&store);
        let hook = store
            .create_hook(&NetworkElement::with_id("vm"), &first)
            .expect("hook");
        let hook_id = hook.id().expect("id");

        // detach from the old chain succeeds, attach to the new one fails
        client.fail_after(
            ResourceKind::PortChain,
            Operation::Update,
            1,
            1,
            ClientError::status(500, "boom"),
        );
        let err = store.update_hook_chain(hook_id, &second).unwrap_err();
        assert!(matches!(err, RedirectionError::Backend { .. }));

        let chains = store.chains_containing_hook(hook_id).expect("chains");
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].element_id, first);
    }

    #[test]
    fn test_close_releases_client() {
        let client = InMemorySfcClient::new();
        let mut store = RemoteGraphStore::new(&client);
        store.close().expect("close");
        store.close().expect("close again");
        assert!(store.is_closed());
        assert!(matches!(
            store.list_chains(),
            Err(RedirectionError::ConnectionError(_))
        ));
    }
}
