use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{bind, from_db_timestamp, parse_uuid, to_db_timestamp, SqlParams};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_dosage(conn: &Connection, dosage: &DosageInstance) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dosage_instances (id, medicine_id, scheduled_time, is_taken, taken_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            dosage.id.to_string(),
            dosage.medicine_id.to_string(),
            to_db_timestamp(&dosage.scheduled_time),
            dosage.is_taken as i32,
            dosage.taken_time.as_ref().map(to_db_timestamp),
        ],
    )?;
    Ok(())
}

/// Persists the taken state of an existing dose.
pub fn update_dosage(conn: &Connection, dosage: &DosageInstance) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE dosage_instances SET scheduled_time = ?2, is_taken = ?3, taken_time = ?4
         WHERE id = ?1",
        params![
            dosage.id.to_string(),
            to_db_timestamp(&dosage.scheduled_time),
            dosage.is_taken as i32,
            dosage.taken_time.as_ref().map(to_db_timestamp),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Dosage",
            id: dosage.id,
        });
    }
    Ok(())
}

pub fn get_dosage(conn: &Connection, dosage_id: &Uuid) -> Result<Option<DosageInstance>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medicine_id, scheduled_time, is_taken, taken_time
         FROM dosage_instances WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![dosage_id.to_string()], dosage_row_from_rusqlite)?;
    match rows.next() {
        Some(row) => Ok(Some(dosage_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Doses matching the filter, earliest first.
pub fn fetch_dosages(
    conn: &Connection,
    filter: &DosageFilter,
) -> Result<Vec<DosageInstance>, DatabaseError> {
    let (where_clause, params_vec) = dosage_where_clause(filter);
    let sql = format!(
        "SELECT id, medicine_id, scheduled_time, is_taken, taken_time
         FROM dosage_instances {where_clause}
         ORDER BY scheduled_time ASC, rowid ASC"
    );
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), dosage_row_from_rusqlite)?;

    let mut dosages = Vec::new();
    for row in rows {
        dosages.push(dosage_from_row(row?)?);
    }
    Ok(dosages)
}

/// Deletes every dose matching the filter. Returns the number removed.
pub fn delete_dosages(conn: &Connection, filter: &DosageFilter) -> Result<usize, DatabaseError> {
    let (where_clause, params_vec) = dosage_where_clause(filter);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let deleted = conn.execute(
        &format!("DELETE FROM dosage_instances {where_clause}"),
        param_refs.as_slice(),
    )?;
    Ok(deleted)
}

fn dosage_where_clause(filter: &DosageFilter) -> (String, SqlParams) {
    let mut sql = String::from("WHERE 1=1");
    let mut params_vec = SqlParams::new();

    if let Some(ref med_id) = filter.medicine_id {
        let idx = bind(&mut params_vec, med_id.to_string());
        sql.push_str(&format!(" AND medicine_id = ?{idx}"));
    }
    if let Some(ref from) = filter.scheduled_from {
        let idx = bind(&mut params_vec, to_db_timestamp(from));
        sql.push_str(&format!(" AND scheduled_time >= ?{idx}"));
    }
    if let Some(ref before) = filter.scheduled_before {
        let idx = bind(&mut params_vec, to_db_timestamp(before));
        sql.push_str(&format!(" AND scheduled_time < ?{idx}"));
    }

    (sql, params_vec)
}

struct DosageRow {
    id: String,
    medicine_id: String,
    scheduled_time: String,
    is_taken: i32,
    taken_time: Option<String>,
}

fn dosage_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DosageRow, rusqlite::Error> {
    Ok(DosageRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        scheduled_time: row.get(2)?,
        is_taken: row.get(3)?,
        taken_time: row.get(4)?,
    })
}

fn dosage_from_row(row: DosageRow) -> Result<DosageInstance, DatabaseError> {
    Ok(DosageInstance {
        id: parse_uuid(&row.id)?,
        medicine_id: parse_uuid(&row.medicine_id)?,
        scheduled_time: from_db_timestamp(&row.scheduled_time)?,
        is_taken: row.is_taken != 0,
        taken_time: row.taken_time.as_deref().map(from_db_timestamp).transpose()?,
    })
}
