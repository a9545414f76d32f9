//! Backing-store strategy for the redirection graph.
//!
//! [`GraphStore`] is implemented twice: [`SqliteGraphStore`] (local, transactional)
//! and [`RemoteGraphStore`] (remote SFC API, per-resource CRUD only). The manager in
//! [`crate::api`] is generic over the trait and never branches on the regime.
//!
//! Membership is written from one side only: a group's port list is persisted with
//! [`GraphStore::update_group`], a chain's ordered group list with
//! [`GraphStore::update_chain`], and a hook's chain with
//! [`GraphStore::update_hook_chain`]. The reverse views (`parent_id`, `chain_id`,
//! `inspection_hooks`) are derived on read.

pub mod remote;
pub mod sqlite;

pub use remote::{ClientError, DeleteOutcome, InMemorySfcClient, RemoteGraphStore, SfcClient};
pub use sqlite::SqliteGraphStore;

use crate::{
    errors::Result,
    model::{InspectionHook, InspectionPort, NetworkElement, PortPairGroup, ServiceFunctionChain},
};

pub trait GraphStore {
    /// Runs `work` as one unit of work. Joins an enclosing unit if one is open,
    /// otherwise starts one; every write inside is undone if `work` fails.
    ///
    /// Stores without transactions run `work` directly.
    fn required<R, F>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>;

    fn get_port(&self, id: &str) -> Result<Option<InspectionPort>>;
    fn list_ports(&self) -> Result<Vec<InspectionPort>>;
    /// Creates an ungrouped port pair. The store assigns the id.
    fn create_port(&self, ingress: &NetworkElement, egress: &NetworkElement)
    -> Result<InspectionPort>;
    /// Deleting an absent port is not an error.
    fn delete_port(&self, id: &str) -> Result<()>;

    fn get_group(&self, id: &str) -> Result<Option<PortPairGroup>>;
    fn list_groups(&self) -> Result<Vec<PortPairGroup>>;
    fn create_group(&self, port_pairs: &[String]) -> Result<PortPairGroup>;
    /// Persists the group's port membership.
    fn update_group(&self, group: &PortPairGroup) -> Result<PortPairGroup>;
    /// Deletes the group only; member ports survive ungrouped.
    fn delete_group(&self, id: &str) -> Result<()>;

    fn get_chain(&self, id: &str) -> Result<Option<ServiceFunctionChain>>;
    fn list_chains(&self) -> Result<Vec<ServiceFunctionChain>>;
    fn create_chain(&self, port_pair_groups: &[String]) -> Result<ServiceFunctionChain>;
    /// Persists the chain's group membership in the given order.
    fn update_chain(&self, chain: &ServiceFunctionChain) -> Result<ServiceFunctionChain>;
    fn delete_chain(&self, id: &str) -> Result<()>;

    fn get_hook(&self, id: &str) -> Result<Option<InspectionHook>>;
    fn list_hooks(&self) -> Result<Vec<InspectionHook>>;
    fn create_hook(&self, inspected: &NetworkElement, chain_id: &str) -> Result<InspectionHook>;
    /// Detaches the hook from its current chain and attaches it to `chain_id`.
    fn update_hook_chain(&self, hook_id: &str, chain_id: &str) -> Result<InspectionHook>;
    /// Detaches the hook from its chain and deletes it with its inspected element.
    fn delete_hook(&self, id: &str) -> Result<()>;

    /// Ports whose ingress and egress element ids equal the given ids. `None`
    /// matches a missing element.
    fn ports_by_endpoints(
        &self,
        ingress_id: Option<&str>,
        egress_id: Option<&str>,
    ) -> Result<Vec<InspectionPort>>;
    fn groups_containing_port(&self, port_id: &str) -> Result<Vec<PortPairGroup>>;
    fn chains_containing_group(&self, group_id: &str) -> Result<Vec<ServiceFunctionChain>>;
    fn chains_containing_hook(&self, hook_id: &str) -> Result<Vec<ServiceFunctionChain>>;
    fn hooks_by_inspected_and_chain(
        &self,
        inspected_id: &str,
        chain_id: &str,
    ) -> Result<Vec<InspectionHook>>;

    /// Releases the session or connection. Calling it twice is a no-op.
    fn close(&mut self) -> Result<()>;
}
