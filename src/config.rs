//! Configuration for backing-store selection and backend-specific options.
//!
//! ```rust
//! use sfcgraph::config::{BackendKind, StoreConfig};
//!
//! let cfg = StoreConfig::from_json_str(r#"{ "backend": "remote" }"#).unwrap();
//! assert_eq!(cfg.backend, BackendKind::Remote);
//! assert_eq!(cfg.remote.name_prefix, "OSC");
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{RedirectionError, Result};

/// Which consistency regime backs the redirection graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local relational store with ACID transactions.
    #[default]
    Sqlite,
    /// Third-party SFC REST API with per-resource CRUD only.
    Remote,
}

/// Options for the local SQLite regime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteConfig {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: Option<u64>,
    /// Extra `PRAGMA name = value` statements applied after opening.
    pub pragma_settings: BTreeMap<String, String>,
}

/// Options for the remote regime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Prefix of generated resource names, e.g. `OSCPortPair-1a2b3c4d`.
    pub name_prefix: String,
    /// Suffix of generated descriptions, e.g. `Port Pair created by OSC`.
    pub description_suffix: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name_prefix: "OSC".to_string(),
            description_suffix: "created by OSC".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn resource_name(&self, kind: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}-{}", self.name_prefix, kind, &suffix[..8])
    }

    pub fn description(&self, label: &str) -> String {
        format!("{label} {}", self.description_suffix)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub sqlite: SqliteConfig,
    pub remote: RemoteConfig,
}

impl StoreConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn sqlite() -> Self {
        Self::new(BackendKind::Sqlite)
    }

    pub fn remote() -> Self {
        Self::new(BackendKind::Remote)
    }

    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.sqlite.path = Some(path.into());
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| RedirectionError::config(e.to_string()))
    }

    pub(crate) fn expect_backend(&self, expected: BackendKind) -> Result<()> {
        if self.backend != expected {
            return Err(RedirectionError::config(format!(
                "configured backend {:?} does not match requested {:?}",
                self.backend, expected
            )));
        }
        Ok(())
    }
}
