use rusqlite::{params, Connection};

use super::{bind, from_db_timestamp, parse_uuid, to_db_timestamp, SqlParams};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_history_entry(conn: &Connection, entry: &HistoryEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO history_entries (id, medicine_id, action, timestamp, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.id.to_string(),
            entry.medicine_id.to_string(),
            entry.action,
            to_db_timestamp(&entry.timestamp),
            entry.notes,
        ],
    )?;
    Ok(())
}

/// Newest first. Entries sharing a timestamp keep insertion order (later first).
pub fn fetch_history(
    conn: &Connection,
    filter: &HistoryFilter,
) -> Result<Vec<HistoryItem>, DatabaseError> {
    let mut sql = String::from(
        "SELECT h.id, h.medicine_id, h.action, h.timestamp, h.notes, m.name
         FROM history_entries h
         LEFT JOIN medicines m ON h.medicine_id = m.id
         WHERE 1=1",
    );
    let mut params_vec = SqlParams::new();

    if let Some(ref med_id) = filter.medicine_id {
        let idx = bind(&mut params_vec, med_id.to_string());
        sql.push_str(&format!(" AND h.medicine_id = ?{idx}"));
    }
    sql.push_str(" ORDER BY h.timestamp DESC, h.rowid DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, medicine_id, action, timestamp, notes, medicine_name) = row?;
        items.push(HistoryItem {
            entry: HistoryEntry {
                id: parse_uuid(&id)?,
                medicine_id: parse_uuid(&medicine_id)?,
                action,
                timestamp: from_db_timestamp(&timestamp)?,
                notes,
            },
            medicine_name,
        });
    }
    Ok(items)
}
