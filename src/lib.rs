//! Inspection-port, inspection-hook and service-function-chain graph kept
//! consistent over a local SQLite store or a remote SFC API.
//!
//! [`RedirectionApi`] is the entry point; [`SfcController`] builds one for
//! either regime from a [`StoreConfig`].
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod api;
pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod lookup;
pub mod model;

pub use crate::api::RedirectionApi;
pub use crate::backend::{
    ClientError, DeleteOutcome, GraphStore, InMemorySfcClient, RemoteGraphStore, SfcClient,
    SqliteGraphStore,
};
pub use crate::config::{BackendKind, RemoteConfig, SqliteConfig, StoreConfig};
pub use crate::controller::{ControllerCapabilities, ControllerStatus, FlowPortInfo, SfcController};
pub use crate::errors::{Operation, RedirectionError, ResourceKind};
pub use crate::lookup::RedirectionLookup;
pub use crate::model::{
    FailurePolicyType, InspectionHook, InspectionPort, NetworkElement, PortPairGroup,
    ServiceFunctionChain, TagEncapsulationType,
};
