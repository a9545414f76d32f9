//! Row mapping and small query helpers shared by the SQLite store.

use rusqlite::{Connection, Params, Row, params};

use crate::{
    errors::{RedirectionError, Result},
    model::{InspectionPort, NetworkElement},
};

pub(crate) fn sql_err(e: rusqlite::Error) -> RedirectionError {
    RedirectionError::query(e.to_string())
}

pub(crate) fn encode_list(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| RedirectionError::query(e.to_string()))
}

pub(crate) fn decode_list(raw: Option<String>) -> Result<Vec<String>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.is_empty() => Ok(Vec::new()),
        Some(text) => {
            serde_json::from_str(&text).map_err(|e| RedirectionError::query(e.to_string()))
        }
    }
}

/// Collects the first column of every row as a string.
pub(crate) fn query_strings<P: Params>(conn: &Connection, sql: &str, args: P) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(sql).map_err(sql_err)?;
    let rows = stmt.query_map(args, |row| row.get(0)).map_err(sql_err)?;
    let mut values = Vec::new();
    for value in rows {
        values.push(value.map_err(sql_err)?);
    }
    Ok(values)
}

/// Stores an element row and returns its surrogate key.
pub(crate) fn insert_element(conn: &Connection, element: &NetworkElement) -> Result<i64> {
    conn.execute(
        "INSERT INTO network_elements(element_id, parent_id, mac_addresses, port_ips) VALUES(?1, ?2, ?3, ?4)",
        params![
            element.element_id,
            element.parent_id,
            encode_list(&element.mac_addresses)?,
            encode_list(&element.port_ips)?,
        ],
    )
    .map_err(sql_err)?;
    Ok(conn.last_insert_rowid())
}

/// Deletes element rows no port or hook references any more.
pub(crate) fn delete_orphan_elements(conn: &Connection, keys: &[i64]) -> Result<()> {
    for key in keys {
        conn.execute(
            "DELETE FROM network_elements WHERE id=?1
               AND NOT EXISTS (SELECT 1 FROM inspection_ports WHERE ingress_fk=?1 OR egress_fk=?1)
               AND NOT EXISTS (SELECT 1 FROM inspection_hooks WHERE inspected_port_fk=?1)",
            [key],
        )
        .map_err(sql_err)?;
    }
    Ok(())
}

/// Columns: element_id, parent_id, mac_addresses, port_ips, starting at `offset`.
/// A NULL surrogate key at `offset - 1` means the element is absent.
pub(crate) fn element_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<RawElement>> {
    let key: Option<i64> = row.get(offset - 1)?;
    if key.is_none() {
        return Ok(None);
    }
    Ok(Some(RawElement {
        element_id: row.get(offset)?,
        parent_id: row.get(offset + 1)?,
        mac_addresses: row.get(offset + 2)?,
        port_ips: row.get(offset + 3)?,
    }))
}

pub(crate) struct RawElement {
    element_id: Option<String>,
    parent_id: Option<String>,
    mac_addresses: Option<String>,
    port_ips: Option<String>,
}

impl RawElement {
    pub(crate) fn decode(self) -> Result<NetworkElement> {
        Ok(NetworkElement {
            element_id: self.element_id,
            parent_id: self.parent_id,
            mac_addresses: decode_list(self.mac_addresses)?,
            port_ips: decode_list(self.port_ips)?,
        })
    }
}

pub(crate) struct RawPort {
    element_id: String,
    parent_id: Option<String>,
    ingress: Option<RawElement>,
    egress: Option<RawElement>,
}

impl RawPort {
    pub(crate) fn decode(self) -> Result<InspectionPort> {
        Ok(InspectionPort {
            element_id: Some(self.element_id),
            parent_id: self.parent_id,
            ingress: self.ingress.map(RawElement::decode).transpose()?,
            egress: self.egress.map(RawElement::decode).transpose()?,
        })
    }
}

/// Maps a row selected with [`super::impl_::PORT_SELECT`].
pub(crate) fn row_to_port(row: &Row<'_>) -> rusqlite::Result<RawPort> {
    Ok(RawPort {
        element_id: row.get(0)?,
        parent_id: row.get(1)?,
        ingress: element_at(row, 3)?,
        egress: element_at(row, 8)?,
    })
}
