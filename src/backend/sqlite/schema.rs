use rusqlite::{Connection, OptionalExtension};

use crate::errors::{RedirectionError, Result};

pub const SCHEMA_VERSION: i64 = 1;

pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS sfc_meta (
            id             INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS network_elements (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            element_id    TEXT,
            parent_id     TEXT,
            mac_addresses TEXT NOT NULL,
            port_ips      TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS service_function_chains (
            element_id TEXT PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS port_pair_groups (
            element_id TEXT PRIMARY KEY,
            sfc_fk     TEXT REFERENCES service_function_chains(element_id),
            ppg_order  INTEGER
        );
        CREATE TABLE IF NOT EXISTS inspection_ports (
            element_id         TEXT PRIMARY KEY,
            port_pair_group_fk TEXT REFERENCES port_pair_groups(element_id),
            ingress_fk         INTEGER REFERENCES network_elements(id),
            egress_fk          INTEGER REFERENCES network_elements(id)
        );
        CREATE TABLE IF NOT EXISTS inspection_hooks (
            hook_id           TEXT PRIMARY KEY,
            inspected_port_fk INTEGER NOT NULL REFERENCES network_elements(id),
            sfc_fk            TEXT NOT NULL REFERENCES service_function_chains(element_id)
        );
        CREATE INDEX IF NOT EXISTS idx_elements_element_id ON network_elements(element_id);
        CREATE INDEX IF NOT EXISTS idx_groups_sfc ON port_pair_groups(sfc_fk, ppg_order);
        CREATE INDEX IF NOT EXISTS idx_ports_group ON inspection_ports(port_pair_group_fk);
        CREATE INDEX IF NOT EXISTS idx_hooks_sfc ON inspection_hooks(sfc_fk);
        "#,
    )
    .map_err(|e| RedirectionError::schema(e.to_string()))?;
    ensure_meta(conn)
}

pub fn read_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT schema_version FROM sfc_meta WHERE id=1", [], |row| {
        row.get(0)
    })
    .map_err(|e| RedirectionError::schema(e.to_string()))
}

fn ensure_meta(conn: &Connection) -> Result<()> {
    let version: Option<i64> = conn
        .query_row("SELECT schema_version FROM sfc_meta WHERE id=1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| RedirectionError::schema(e.to_string()))?;
    match version {
        Some(existing) if existing > SCHEMA_VERSION => Err(RedirectionError::schema(format!(
            "database schema version {existing} is newer than supported {SCHEMA_VERSION}"
        ))),
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO sfc_meta(id, schema_version) VALUES(1, ?1)",
                [SCHEMA_VERSION],
            )
            .map_err(|e| RedirectionError::schema(e.to_string()))?;
            Ok(())
        }
    }
}
