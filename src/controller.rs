//! Controller entry point: status, advertised capabilities and construction of
//! a [`RedirectionApi`] over either regime.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    api::RedirectionApi,
    backend::{RemoteGraphStore, SfcClient, SqliteGraphStore},
    config::{BackendKind, StoreConfig},
    errors::{RedirectionError, Result},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub name: String,
    pub version: String,
    pub ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerCapabilities {
    pub offbox_redirection: bool,
    pub service_function_chaining: bool,
    pub failure_policy: bool,
    pub uses_provider_credentials: bool,
    pub query_port_info: bool,
    pub port_group: bool,
    pub neutron_sfc: bool,
}

pub struct SfcController {
    config: StoreConfig,
}

impl SfcController {
    pub const NAME: &'static str = "Neutron-sfc";
    pub const VERSION: &'static str = "0.1";

    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            name: Self::NAME.to_string(),
            version: Self::VERSION.to_string(),
            ready: true,
        }
    }

    pub fn capabilities(&self) -> ControllerCapabilities {
        ControllerCapabilities {
            offbox_redirection: false,
            service_function_chaining: false,
            failure_policy: false,
            uses_provider_credentials: true,
            query_port_info: false,
            port_group: false,
            neutron_sfc: true,
        }
    }

    /// Flow-based port queries are not available on this controller.
    pub fn query_port_info<I>(&self, _ports: I) -> Result<Vec<FlowPortInfo>>
    where
        I: IntoIterator<Item = String>,
    {
        Err(RedirectionError::unsupported(
            "Neutron SFC SDN Controller does not support flow based query",
        ))
    }

    pub fn open_local(&self) -> Result<RedirectionApi<SqliteGraphStore>> {
        self.config.expect_backend(BackendKind::Sqlite)?;
        let store = SqliteGraphStore::from_config(&self.config.sqlite)?;
        info!(path = ?self.config.sqlite.path, "opened local redirection store");
        Ok(RedirectionApi::new(store))
    }

    pub fn with_remote<C: SfcClient>(&self, client: C) -> Result<RedirectionApi<RemoteGraphStore<C>>> {
        self.config.expect_backend(BackendKind::Remote)?;
        let store = RemoteGraphStore::with_config(client, self.config.remote.clone());
        info!(prefix = %self.config.remote.name_prefix, "attached remote redirection store");
        Ok(RedirectionApi::new(store))
    }
}

/// Per-port flow information a flow-based port query would return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPortInfo {
    pub port_id: String,
    pub flow_tag: Option<String>,
}
