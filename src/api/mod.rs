//! Relationship-consistency manager.
//!
//! [`RedirectionApi`] keeps the port → group → chain graph and the hook → chain
//! links consistent on top of any [`GraphStore`]. Every mutating operation runs
//! as one unit of work through [`GraphStore::required`]: atomic in the local
//! regime, a sequence of individually committed calls in the remote one.

mod chain_ops;
mod hook_ops;
mod port_ops;
mod unsupported;

use tracing::info;

use crate::{backend::GraphStore, errors::Result, lookup::RedirectionLookup};

pub struct RedirectionApi<S: GraphStore> {
    store: S,
}

impl<S: GraphStore> RedirectionApi<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn lookup(&self) -> RedirectionLookup<'_, S> {
        RedirectionLookup::new(&self.store)
    }

    /// Releases the backing-store session. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        info!("closing redirection api");
        self.store.close()
    }
}
