use rusqlite::Connection;
use tracing::debug;

use crate::errors::{RedirectionError, Result};

/// Open transaction that rolls back on drop unless committed.
pub(crate) struct TransactionGuard<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl<'a> TransactionGuard<'a> {
    /// IMMEDIATE takes the write lock up front so read-modify-write sequences
    /// cannot interleave with another writer.
    pub fn begin(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| RedirectionError::transaction(e.to_string()))?;
        debug!("transaction started");
        Ok(Self {
            conn,
            finished: false,
        })
    }

    pub fn commit(mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| RedirectionError::transaction(e.to_string()))?;
        self.finished = true;
        debug!("transaction committed");
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| RedirectionError::transaction(e.to_string()))?;
        debug!("transaction rolled back");
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
