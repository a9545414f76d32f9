use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};

use super::{
    helpers::{
        delete_orphan_elements, element_at, insert_element, query_strings, row_to_port, sql_err,
    },
    schema::{ensure_schema, read_schema_version},
    transaction::TransactionGuard,
};
use crate::{
    backend::GraphStore,
    config::SqliteConfig,
    errors::{RedirectionError, Result},
    model::{InspectionHook, InspectionPort, NetworkElement, PortPairGroup, ServiceFunctionChain},
};

pub(crate) const PORT_SELECT: &str = "SELECT p.element_id, p.port_pair_group_fk, \
     i.id, i.element_id, i.parent_id, i.mac_addresses, i.port_ips, \
     e.id, e.element_id, e.parent_id, e.mac_addresses, e.port_ips \
     FROM inspection_ports p \
     LEFT JOIN network_elements i ON i.id = p.ingress_fk \
     LEFT JOIN network_elements e ON e.id = p.egress_fk";

const HOOK_SELECT: &str = "SELECT h.hook_id, h.sfc_fk, \
     n.id, n.element_id, n.parent_id, n.mac_addresses, n.port_ips \
     FROM inspection_hooks h \
     JOIN network_elements n ON n.id = h.inspected_port_fk";

/// Local transactional store.
///
/// Every write method joins the caller's unit of work (see [`GraphStore::required`])
/// or, when called on its own, runs in a unit of its own.
pub struct SqliteGraphStore {
    conn: Option<Connection>,
    tx_depth: Cell<usize>,
    rollback_only: Cell<bool>,
}

/// Restores the nesting depth even if the unit of work unwinds.
struct DepthReset<'a> {
    depth: &'a Cell<usize>,
    restore: usize,
}

impl Drop for DepthReset<'_> {
    fn drop(&mut self) {
        self.depth.set(self.restore);
    }
}

impl SqliteGraphStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn =
            Connection::open(path).map_err(|e| RedirectionError::connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RedirectionError::connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn from_config(cfg: &SqliteConfig) -> Result<Self> {
        let conn = match &cfg.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| RedirectionError::connection(e.to_string()))?;
        if let Some(ms) = cfg.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(|e| RedirectionError::connection(e.to_string()))?;
        }
        for (key, value) in &cfg.pragma_settings {
            let pragma_sql = format!("PRAGMA {key} = {value}");
            match conn.execute(&pragma_sql, []) {
                Ok(_) | Err(rusqlite::Error::ExecuteReturnedResults) => {}
                Err(e) => {
                    return Err(RedirectionError::connection(format!(
                        "PRAGMA {key} = {value}: {e}"
                    )));
                }
            }
        }
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.set_prepared_statement_cache_capacity(64);
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Some(conn),
            tx_depth: Cell::new(0),
            rollback_only: Cell::new(false),
        })
    }

    pub fn schema_version(&self) -> Result<i64> {
        read_schema_version(self.connection()?)
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    pub fn in_transaction(&self) -> bool {
        self.tx_depth.get() > 0
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| RedirectionError::connection("store is closed"))
    }

    fn port_keys(&self, id: &str) -> Result<Option<(Option<i64>, Option<i64>)>> {
        self.connection()?
            .query_row(
                "SELECT ingress_fk, egress_fk FROM inspection_ports WHERE element_id=?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sql_err)
    }

    fn group_exists(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .connection()?
            .query_row(
                "SELECT 1 FROM port_pair_groups WHERE element_id=?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        Ok(found.is_some())
    }

    fn chain_exists(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .connection()?
            .query_row(
                "SELECT 1 FROM service_function_chains WHERE element_id=?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        Ok(found.is_some())
    }

    fn link_ports(&self, group_id: &str, port_pairs: &[String]) -> Result<()> {
        let conn = self.connection()?;
        for port_id in port_pairs {
            let updated = conn
                .execute(
                    "UPDATE inspection_ports SET port_pair_group_fk=?1 WHERE element_id=?2",
                    params![group_id, port_id],
                )
                .map_err(sql_err)?;
            if updated == 0 {
                return Err(RedirectionError::not_found("Inspection Port", port_id.as_str()));
            }
        }
        Ok(())
    }

    fn bind_groups(&self, chain_id: &str, groups: &[String]) -> Result<()> {
        let conn = self.connection()?;
        for (order, group_id) in groups.iter().enumerate() {
            let updated = conn
                .execute(
                    "UPDATE port_pair_groups SET sfc_fk=?1, ppg_order=?2 WHERE element_id=?3",
                    params![chain_id, order as i64, group_id],
                )
                .map_err(sql_err)?;
            if updated == 0 {
                return Err(RedirectionError::not_found("Port Pair Group", group_id.as_str()));
            }
        }
        Ok(())
    }

    fn unbind_groups(&self, chain_id: &str) -> Result<()> {
        self.connection()?
            .execute(
                "UPDATE port_pair_groups SET sfc_fk=NULL, ppg_order=NULL WHERE sfc_fk=?1",
                [chain_id],
            )
            .map_err(sql_err)?;
        Ok(())
    }

    fn select_ports(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<InspectionPort>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(sql).map_err(sql_err)?;
        let rows = stmt.query_map(args, row_to_port).map_err(sql_err)?;
        let mut ports = Vec::new();
        for row in rows {
            ports.push(row.map_err(sql_err)?.decode()?);
        }
        Ok(ports)
    }

    fn select_hooks(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<InspectionHook>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(args, |row| {
                let hook_id: String = row.get(0)?;
                let chain_id: String = row.get(1)?;
                Ok((hook_id, chain_id, element_at(row, 3)?))
            })
            .map_err(sql_err)?;
        let mut hooks = Vec::new();
        for row in rows {
            let (hook_id, chain_id, inspected) = row.map_err(sql_err)?;
            hooks.push(InspectionHook {
                hook_id: Some(hook_id),
                inspected_port: inspected.map(|raw| raw.decode()).transpose()?,
                chain_id: Some(chain_id),
            });
        }
        Ok(hooks)
    }

    fn hook_chain(&self, hook_id: &str) -> Result<Option<String>> {
        self.connection()?
            .query_row(
                "SELECT sfc_fk FROM inspection_hooks WHERE hook_id=?1",
                [hook_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)
    }
}

impl GraphStore for SqliteGraphStore {
    fn required<R, F>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> Result<R>,
    {
        let conn = self.connection()?;
        let depth = self.tx_depth.get();
        if depth > 0 {
            let _reset = DepthReset {
                depth: &self.tx_depth,
                restore: depth,
            };
            self.tx_depth.set(depth + 1);
            let result = work();
            if result.is_err() {
                self.rollback_only.set(true);
            }
            return result;
        }

        let guard = TransactionGuard::begin(conn)?;
        self.rollback_only.set(false);
        let result = {
            let _reset = DepthReset {
                depth: &self.tx_depth,
                restore: 0,
            };
            self.tx_depth.set(1);
            work()
        };
        let rollback_only = self.rollback_only.replace(false);
        match result {
            Ok(value) if !rollback_only => {
                guard.commit()?;
                Ok(value)
            }
            Ok(_) => {
                guard.rollback()?;
                Err(RedirectionError::transaction(
                    "unit of work was marked rollback-only by a failed inner unit",
                ))
            }
            Err(err) => {
                if let Err(rollback_err) = guard.rollback() {
                    warn!(error = %rollback_err, "rollback after failed unit of work did not complete");
                }
                Err(err)
            }
        }
    }

    fn get_port(&self, id: &str) -> Result<Option<InspectionPort>> {
        let sql = format!("{PORT_SELECT} WHERE p.element_id=?1");
        Ok(self.select_ports(&sql, [id])?.into_iter().next())
    }

    fn list_ports(&self) -> Result<Vec<InspectionPort>> {
        let sql = format!("{PORT_SELECT} ORDER BY p.rowid");
        self.select_ports(&sql, [])
    }

    fn create_port(
        &self,
        ingress: &NetworkElement,
        egress: &NetworkElement,
    ) -> Result<InspectionPort> {
        self.required(|| {
            let conn = self.connection()?;
            let ingress_key = insert_element(conn, ingress)?;
            let egress_key = match (ingress.id(), egress.id()) {
                (Some(a), Some(b)) if a == b => ingress_key,
                _ => insert_element(conn, egress)?,
            };
            let id = uuid::Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO inspection_ports(element_id, port_pair_group_fk, ingress_fk, egress_fk) VALUES(?1, NULL, ?2, ?3)",
                params![id, ingress_key, egress_key],
            )
            .map_err(sql_err)?;
            debug!(port = %id, "created inspection port");
            self.get_port(&id)?
                .ok_or_else(|| RedirectionError::not_found("Inspection Port", id.as_str()))
        })
    }

    fn delete_port(&self, id: &str) -> Result<()> {
        self.required(|| {
            let Some((ingress_key, egress_key)) = self.port_keys(id)? else {
                return Ok(());
            };
            let conn = self.connection()?;
            conn.execute("DELETE FROM inspection_ports WHERE element_id=?1", [id])
                .map_err(sql_err)?;
            let keys: Vec<i64> = ingress_key.into_iter().chain(egress_key).collect();
            delete_orphan_elements(conn, &keys)?;
            debug!(port = %id, "deleted inspection port");
            Ok(())
        })
    }

    fn get_group(&self, id: &str) -> Result<Option<PortPairGroup>> {
        let conn = self.connection()?;
        let chain_id: Option<Option<String>> = conn
            .query_row(
                "SELECT sfc_fk FROM port_pair_groups WHERE element_id=?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        let Some(chain_id) = chain_id else {
            return Ok(None);
        };
        let port_pairs = query_strings(
            conn,
            "SELECT element_id FROM inspection_ports WHERE port_pair_group_fk=?1 ORDER BY rowid",
            [id],
        )?;
        Ok(Some(PortPairGroup {
            element_id: id.to_string(),
            port_pairs,
            chain_id,
        }))
    }

    fn list_groups(&self) -> Result<Vec<PortPairGroup>> {
        let ids = query_strings(
            self.connection()?,
            "SELECT element_id FROM port_pair_groups ORDER BY rowid",
            [],
        )?;
        let mut groups = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(group) = self.get_group(&id)? {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    fn create_group(&self, port_pairs: &[String]) -> Result<PortPairGroup> {
        self.required(|| {
            let id = uuid::Uuid::new_v4().to_string();
            self.connection()?
                .execute(
                    "INSERT INTO port_pair_groups(element_id, sfc_fk, ppg_order) VALUES(?1, NULL, NULL)",
                    [&id],
                )
                .map_err(sql_err)?;
            self.link_ports(&id, port_pairs)?;
            debug!(group = %id, members = port_pairs.len(), "created port pair group");
            self.get_group(&id)?
                .ok_or_else(|| RedirectionError::not_found("Port Pair Group", id.as_str()))
        })
    }

    fn update_group(&self, group: &PortPairGroup) -> Result<PortPairGroup> {
        self.required(|| {
            let id = group.element_id.as_str();
            if !self.group_exists(id)? {
                return Err(RedirectionError::not_found("Port Pair Group", id));
            }
            self.connection()?
                .execute(
                    "UPDATE inspection_ports SET port_pair_group_fk=NULL WHERE port_pair_group_fk=?1",
                    [id],
                )
                .map_err(sql_err)?;
            self.link_ports(id, &group.port_pairs)?;
            debug!(group = %id, members = group.port_pairs.len(), "updated port pair group");
            self.get_group(id)?
                .ok_or_else(|| RedirectionError::not_found("Port Pair Group", id))
        })
    }

    fn delete_group(&self, id: &str) -> Result<()> {
        self.required(|| {
            let conn = self.connection()?;
            conn.execute(
                "UPDATE inspection_ports SET port_pair_group_fk=NULL WHERE port_pair_group_fk=?1",
                [id],
            )
            .map_err(sql_err)?;
            conn.execute("DELETE FROM port_pair_groups WHERE element_id=?1", [id])
                .map_err(sql_err)?;
            debug!(group = %id, "deleted port pair group");
            Ok(())
        })
    }

    fn get_chain(&self, id: &str) -> Result<Option<ServiceFunctionChain>> {
        if !self.chain_exists(id)? {
            return Ok(None);
        }
        let conn = self.connection()?;
        let port_pair_groups = query_strings(
            conn,
            "SELECT element_id FROM port_pair_groups WHERE sfc_fk=?1 ORDER BY ppg_order, rowid",
            [id],
        )?;
        let inspection_hooks = query_strings(
            conn,
            "SELECT hook_id FROM inspection_hooks WHERE sfc_fk=?1 ORDER BY rowid",
            [id],
        )?;
        Ok(Some(ServiceFunctionChain {
            element_id: id.to_string(),
            port_pair_groups,
            inspection_hooks,
        }))
    }

    fn list_chains(&self) -> Result<Vec<ServiceFunctionChain>> {
        let ids = query_strings(
            self.connection()?,
            "SELECT element_id FROM service_function_chains ORDER BY rowid",
            [],
        )?;
        let mut chains = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(chain) = self.get_chain(&id)? {
                chains.push(chain);
            }
        }
        Ok(chains)
    }

    fn create_chain(&self, port_pair_groups: &[String]) -> Result<ServiceFunctionChain> {
        self.required(|| {
            let id = uuid::Uuid::new_v4().to_string();
            self.connection()?
                .execute(
                    "INSERT INTO service_function_chains(element_id) VALUES(?1)",
                    [&id],
                )
                .map_err(sql_err)?;
            self.bind_groups(&id, port_pair_groups)?;
            debug!(chain = %id, groups = port_pair_groups.len(), "created service function chain");
            self.get_chain(&id)?
                .ok_or_else(|| RedirectionError::not_found("Service Function Chain", id.as_str()))
        })
    }

    fn update_chain(&self, chain: &ServiceFunctionChain) -> Result<ServiceFunctionChain> {
        self.required(|| {
            let id = chain.element_id.as_str();
            if !self.chain_exists(id)? {
                return Err(RedirectionError::not_found("Service Function Chain", id));
            }
            self.unbind_groups(id)?;
            self.bind_groups(id, &chain.port_pair_groups)?;
            debug!(chain = %id, groups = chain.port_pair_groups.len(), "updated service function chain");
            self.get_chain(id)?
                .ok_or_else(|| RedirectionError::not_found("Service Function Chain", id))
        })
    }

    fn delete_chain(&self, id: &str) -> Result<()> {
        self.required(|| {
            self.unbind_groups(id)?;
            self.connection()?
                .execute("DELETE FROM service_function_chains WHERE element_id=?1", [id])
                .map_err(sql_err)?;
            debug!(chain = %id, "deleted service function chain");
            Ok(())
        })
    }

    fn get_hook(&self, id: &str) -> Result<Option<InspectionHook>> {
        let sql = format!("{HOOK_SELECT} WHERE h.hook_id=?1");
        Ok(self.select_hooks(&sql, [id])?.into_iter().next())
    }

    fn list_hooks(&self) -> Result<Vec<InspectionHook>> {
        let sql = format!("{HOOK_SELECT} ORDER BY h.rowid");
        self.select_hooks(&sql, [])
    }

    fn create_hook(&self, inspected: &NetworkElement, chain_id: &str) -> Result<InspectionHook> {
        self.required(|| {
            if !self.chain_exists(chain_id)? {
                return Err(RedirectionError::not_found("Service Function Chain", chain_id));
            }
            let conn = self.connection()?;
            let element_key = insert_element(conn, inspected)?;
            let id = uuid::Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO inspection_hooks(hook_id, inspected_port_fk, sfc_fk) VALUES(?1, ?2, ?3)",
                params![id, element_key, chain_id],
            )
            .map_err(sql_err)?;
            debug!(hook = %id, chain = %chain_id, "created inspection hook");
            self.get_hook(&id)?
                .ok_or_else(|| RedirectionError::not_found("Inspection Hook", id.as_str()))
        })
    }

    fn update_hook_chain(&self, hook_id: &str, chain_id: &str) -> Result<InspectionHook> {
        self.required(|| {
            if !self.chain_exists(chain_id)? {
                return Err(RedirectionError::not_found("Service Function Chain", chain_id));
            }
            let updated = self
                .connection()?
                .execute(
                    "UPDATE inspection_hooks SET sfc_fk=?1 WHERE hook_id=?2",
                    params![chain_id, hook_id],
                )
                .map_err(sql_err)?;
            if updated == 0 {
                return Err(RedirectionError::not_found("Inspection Hook", hook_id));
            }
            debug!(hook = %hook_id, chain = %chain_id, "moved inspection hook");
            self.get_hook(hook_id)?
                .ok_or_else(|| RedirectionError::not_found("Inspection Hook", hook_id))
        })
    }

    fn delete_hook(&self, id: &str) -> Result<()> {
        self.required(|| {
            let conn = self.connection()?;
            let key: Option<i64> = conn
                .query_row(
                    "SELECT inspected_port_fk FROM inspection_hooks WHERE hook_id=?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;
            let Some(key) = key else {
                return Ok(());
            };
            conn.execute("DELETE FROM inspection_hooks WHERE hook_id=?1", [id])
                .map_err(sql_err)?;
            delete_orphan_elements(conn, &[key])?;
            debug!(hook = %id, "deleted inspection hook");
            Ok(())
        })
    }

    fn ports_by_endpoints(
        &self,
        ingress_id: Option<&str>,
        egress_id: Option<&str>,
    ) -> Result<Vec<InspectionPort>> {
        // IS treats NULL as a comparable value, so a missing endpoint matches a missing id.
        let sql = format!(
            "{PORT_SELECT} WHERE i.element_id IS ?1 AND e.element_id IS ?2 ORDER BY p.rowid"
        );
        self.select_ports(&sql, params![ingress_id, egress_id])
    }

    fn groups_containing_port(&self, port_id: &str) -> Result<Vec<PortPairGroup>> {
        let group_id: Option<Option<String>> = self
            .connection()?
            .query_row(
                "SELECT port_pair_group_fk FROM inspection_ports WHERE element_id=?1",
                [port_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        match group_id.flatten() {
            Some(group_id) => Ok(self.get_group(&group_id)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    fn chains_containing_group(&self, group_id: &str) -> Result<Vec<ServiceFunctionChain>> {
        let chain_id = self.get_group(group_id)?.and_then(|group| group.chain_id);
        match chain_id {
            Some(chain_id) => Ok(self.get_chain(&chain_id)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    fn chains_containing_hook(&self, hook_id: &str) -> Result<Vec<ServiceFunctionChain>> {
        match self.hook_chain(hook_id)? {
            Some(chain_id) => Ok(self.get_chain(&chain_id)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    fn hooks_by_inspected_and_chain(
        &self,
        inspected_id: &str,
        chain_id: &str,
    ) -> Result<Vec<InspectionHook>> {
        let sql = format!("{HOOK_SELECT} WHERE n.element_id=?1 AND h.sfc_fk=?2 ORDER BY h.rowid");
        self.select_hooks(&sql, params![inspected_id, chain_id])
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| RedirectionError::connection(e.to_string()))?;
            debug!("sqlite store closed");
        }
        Ok(())
    }
}
