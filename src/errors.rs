use std::fmt;

use thiserror::Error;

/// Backing-store operation named in a [`RedirectionError::Backend`] failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "Create",
            Operation::Get => "Get",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::List => "List",
        };
        f.write_str(name)
    }
}

/// Resource types exposed by the remote SFC API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PortPair,
    PortPairGroup,
    PortChain,
    FlowClassifier,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::PortPair => "PortPair",
            ResourceKind::PortPairGroup => "PortPairGroup",
            ResourceKind::PortChain => "PortChain",
            ResourceKind::FlowClassifier => "FlowClassifier",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RedirectionError {
    #[error("null passed for {label} !")]
    InvalidInput { label: String },
    #[error("Cannot find {label} by id: {id}!")]
    NotFound { label: String, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("operation not supported: {0}")]
    Unsupported(String),
    #[error("{operation} {resource} failed! Backing store responded: {cause}!")]
    Backend {
        operation: Operation,
        resource: ResourceKind,
        cause: String,
    },
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("transaction error: {0}")]
    TransactionError(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = RedirectionError> = std::result::Result<T, E>;

impl RedirectionError {
    pub fn invalid_input<T: Into<String>>(label: T) -> Self {
        RedirectionError::InvalidInput {
            label: label.into(),
        }
    }

    pub fn not_found<L: Into<String>, I: Into<String>>(label: L, id: I) -> Self {
        RedirectionError::NotFound {
            label: label.into(),
            id: id.into(),
        }
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        RedirectionError::Conflict(msg.into())
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        RedirectionError::Unsupported(msg.into())
    }

    pub fn backend<T: fmt::Display>(operation: Operation, resource: ResourceKind, cause: T) -> Self {
        RedirectionError::Backend {
            operation,
            resource,
            cause: cause.to_string(),
        }
    }

    pub fn connection<T: Into<String>>(msg: T) -> Self {
        RedirectionError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        RedirectionError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        RedirectionError::QueryError(msg.into())
    }

    pub fn transaction<T: Into<String>>(msg: T) -> Self {
        RedirectionError::TransactionError(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        RedirectionError::Config(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RedirectionError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RedirectionError::Conflict(_))
    }
}
