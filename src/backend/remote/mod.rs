//! Remote regime: the graph lives behind a third-party SFC REST API.
//!
//! Port pairs, port pair groups, port chains and flow classifiers map onto
//! inspection ports, groups, chains and hooks. There are no transactions; a
//! multi-step mutation that fails halfway is compensated where a compensating
//! call exists and otherwise left for the next retry to reconcile.

mod client;
mod impl_;
mod memory;
pub mod resources;

pub use client::{ClientError, DeleteOutcome, SfcClient};
pub use impl_::RemoteGraphStore;
pub use memory::InMemorySfcClient;
