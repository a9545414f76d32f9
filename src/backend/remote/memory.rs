//! In-process stand-in for the remote SFC API.
//!
//! Documents are kept as JSON so the client exercises the same serde shapes a
//! REST client would. Failures can be scripted per resource kind and operation.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{
    client::{ClientError, DeleteOutcome, SfcClient},
    resources::Resource,
};
use crate::errors::{Operation, ResourceKind};

struct StoredDocument {
    seq: u64,
    body: Value,
}

struct FaultEntry {
    skip: usize,
    remaining: usize,
    error: ClientError,
}

type FaultKey = (ResourceKind, Operation);

#[derive(Default)]
pub struct InMemorySfcClient {
    tables: RwLock<AHashMap<ResourceKind, AHashMap<String, StoredDocument>>>,
    faults: Mutex<AHashMap<FaultKey, FaultEntry>>,
    calls: Mutex<AHashMap<FaultKey, usize>>,
    next_seq: AtomicU64,
}

impl InMemorySfcClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of `operation` on `kind` fail with `error`.
    /// `times == 0` clears the fault.
    pub fn fail_next(
        &self,
        kind: ResourceKind,
        operation: Operation,
        times: usize,
        error: ClientError,
    ) {
        self.fail_after(kind, operation, 0, times, error);
    }

    /// Like [`Self::fail_next`], but lets `skip` calls succeed first.
    pub fn fail_after(
        &self,
        kind: ResourceKind,
        operation: Operation,
        skip: usize,
        times: usize,
        error: ClientError,
    ) {
        let mut faults = self.faults.lock();
        if times == 0 {
            faults.remove(&(kind, operation));
        } else {
            faults.insert(
                (kind, operation),
                FaultEntry {
                    skip,
                    remaining: times,
                    error,
                },
            );
        }
    }

    /// Number of stored documents of `kind`.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.tables.read().get(&kind).map_or(0, |table| table.len())
    }

    /// Number of calls made for `kind` and `operation`, failed ones included.
    pub fn call_count(&self, kind: ResourceKind, operation: Operation) -> usize {
        self.calls
            .lock()
            .get(&(kind, operation))
            .copied()
            .unwrap_or(0)
    }

    /// Stores `body` verbatim under a fresh id, bypassing serialization.
    pub fn seed_raw(&self, kind: ResourceKind, mut body: Value) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        if let Value::Object(map) = &mut body {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        self.store(kind, id.clone(), body);
        id
    }

    fn store(&self, kind: ResourceKind, id: String, body: Value) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.tables
            .write()
            .entry(kind)
            .or_default()
            .insert(id, StoredDocument { seq, body });
    }

    fn enter(&self, kind: ResourceKind, operation: Operation) -> Result<(), ClientError> {
        *self.calls.lock().entry((kind, operation)).or_insert(0) += 1;
        let mut faults = self.faults.lock();
        if let Some(entry) = faults.get_mut(&(kind, operation)) {
            if entry.skip > 0 {
                entry.skip -= 1;
                return Ok(());
            }
            entry.remaining -= 1;
            let error = entry.error.clone();
            if entry.remaining == 0 {
                faults.remove(&(kind, operation));
            }
            return Err(error);
        }
        Ok(())
    }

    fn not_found(kind: ResourceKind, id: &str) -> ClientError {
        ClientError::status(404, format!("{kind} {id} could not be found"))
    }
}

fn decode<R: Resource>(body: &Value) -> Result<R, ClientError> {
    serde_json::from_value(body.clone()).map_err(|e| ClientError::Malformed(e.to_string()))
}

fn encode<R: Resource>(resource: &R) -> Result<Value, ClientError> {
    serde_json::to_value(resource).map_err(|e| ClientError::Malformed(e.to_string()))
}

impl SfcClient for InMemorySfcClient {
    fn create<R: Resource>(&self, resource: &R) -> Result<R, ClientError> {
        self.enter(R::KIND, Operation::Create)?;
        let id = uuid::Uuid::new_v4().to_string();
        let mut created = resource.clone();
        created.set_id(id.clone());
        let body = encode(&created)?;
        self.store(R::KIND, id, body);
        Ok(created)
    }

    fn get<R: Resource>(&self, id: &str) -> Result<Option<R>, ClientError> {
        self.enter(R::KIND, Operation::Get)?;
        let tables = self.tables.read();
        match tables.get(&R::KIND).and_then(|table| table.get(id)) {
            Some(doc) => decode(&doc.body).map(Some),
            None => Ok(None),
        }
    }

    fn update<R: Resource>(&self, id: &str, resource: &R) -> Result<R, ClientError> {
        self.enter(R::KIND, Operation::Update)?;
        let patch = encode(resource)?;
        let mut tables = self.tables.write();
        let doc = tables
            .get_mut(&R::KIND)
            .and_then(|table| table.get_mut(id))
            .ok_or_else(|| Self::not_found(R::KIND, id))?;
        if let (Value::Object(stored), Value::Object(changes)) = (&mut doc.body, patch) {
            for (key, value) in changes {
                if key != "id" && !value.is_null() {
                    stored.insert(key, value);
                }
            }
        }
        decode(&doc.body)
    }

    fn delete<R: Resource>(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        self.enter(R::KIND, Operation::Delete)?;
        let removed = self
            .tables
            .write()
            .get_mut(&R::KIND)
            .and_then(|table| table.remove(id));
        Ok(match removed {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    fn list<R: Resource>(&self) -> Result<Vec<R>, ClientError> {
        self.enter(R::KIND, Operation::List)?;
        let tables = self.tables.read();
        let Some(table) = tables.get(&R::KIND) else {
            return Ok(Vec::new());
        };
        let mut docs: Vec<&StoredDocument> = table.values().collect();
        docs.sort_by_key(|doc| doc.seq);
        docs.into_iter().map(|doc| decode(&doc.body)).collect()
    }
}
