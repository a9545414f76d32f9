use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::resources::Resource;

/// Failure reported by the remote SFC API or the transport in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{code} {fault}")]
    Status { code: u16, fault: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn status<T: Into<String>>(code: u16, fault: T) -> Self {
        ClientError::Status {
            code,
            fault: fault.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { code: 404, .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Per-resource CRUD against the remote SFC API. Nothing spans two calls.
pub trait SfcClient {
    /// Creates the resource; the server assigns the id.
    fn create<R: Resource>(&self, resource: &R) -> Result<R, ClientError>;
    fn get<R: Resource>(&self, id: &str) -> Result<Option<R>, ClientError>;
    /// Applies the non-null attributes of `resource` to the stored one.
    fn update<R: Resource>(&self, id: &str, resource: &R) -> Result<R, ClientError>;
    fn delete<R: Resource>(&self, id: &str) -> Result<DeleteOutcome, ClientError>;
    fn list<R: Resource>(&self) -> Result<Vec<R>, ClientError>;
}

impl<C> SfcClient for &C
where
    C: SfcClient,
{
    fn create<R: Resource>(&self, resource: &R) -> Result<R, ClientError> {
        (*self).create(resource)
    }

    fn get<R: Resource>(&self, id: &str) -> Result<Option<R>, ClientError> {
        (*self).get(id)
    }

    fn update<R: Resource>(&self, id: &str, resource: &R) -> Result<R, ClientError> {
        (*self).update(id, resource)
    }

    fn delete<R: Resource>(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        (*self).delete::<R>(id)
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, ClientError> {
        (*self).list()
    }
}

impl<C> SfcClient for Arc<C>
where
    C: SfcClient,
{
    fn create<R: Resource>(&self, resource: &R) -> Result<R, ClientError> {
        self.as_ref().create(resource)
    }

    fn get<R: Resource>(&self, id: &str) -> Result<Option<R>, ClientError> {
        self.as_ref().get(id)
    }

    fn update<R: Resource>(&self, id: &str, resource: &R) -> Result<R, ClientError> {
        self.as_ref().update(id, resource)
    }

    fn delete<R: Resource>(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        self.as_ref().delete::<R>(id)
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, ClientError> {
        self.as_ref().list()
    }
}
