use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{bind, from_db_timestamp, parse_uuid, to_db_timestamp, SqlParams};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const MEDICINE_COLUMNS: &str = "id, name, dosage, dosage_form, frequency, category, prescribed_by,
     instructions, side_effects, quantity, refill_date, created_at, is_active";

pub fn insert_medicine(conn: &Connection, med: &Medicine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (id, name, dosage, dosage_form, frequency, category, prescribed_by,
         instructions, side_effects, quantity, refill_date, created_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            med.id.to_string(),
            med.name,
            med.dosage,
            med.dosage_form.as_str(),
            med.frequency.as_str(),
            med.category.map(|c| c.as_str()),
            med.prescribed_by,
            med.instructions,
            med.side_effects,
            med.quantity,
            med.refill_date.as_ref().map(to_db_timestamp),
            to_db_timestamp(&med.created_at),
            med.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Overwrites every mutable column. `created_at` is immutable.
pub fn update_medicine(conn: &Connection, med: &Medicine) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medicines SET name = ?2, dosage = ?3, dosage_form = ?4, frequency = ?5,
         category = ?6, prescribed_by = ?7, instructions = ?8, side_effects = ?9,
         quantity = ?10, refill_date = ?11, is_active = ?12
         WHERE id = ?1",
        params![
            med.id.to_string(),
            med.name,
            med.dosage,
            med.dosage_form.as_str(),
            med.frequency.as_str(),
            med.category.map(|c| c.as_str()),
            med.prescribed_by,
            med.instructions,
            med.side_effects,
            med.quantity,
            med.refill_date.as_ref().map(to_db_timestamp),
            med.is_active as i32,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Medicine",
            id: med.id,
        });
    }
    Ok(())
}

pub fn delete_medicine(conn: &Connection, med_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medicines WHERE id = ?1",
        params![med_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Medicine",
            id: *med_id,
        });
    }
    Ok(())
}

pub fn get_medicine(conn: &Connection, med_id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![med_id.to_string()], medicine_row_from_rusqlite)?;
    match rows.next() {
        Some(row) => Ok(Some(medicine_from_row(row?)?)),
        None => Ok(None),
    }
}

pub fn fetch_medicines(
    conn: &Connection,
    filter: &MedicineFilter,
) -> Result<Vec<Medicine>, DatabaseError> {
    let (where_clause, params_vec) = medicine_where_clause(filter);
    let order = match filter.order {
        MedicineOrder::Name => "name COLLATE NOCASE ASC",
        MedicineOrder::RefillDate => "refill_date ASC",
    };
    let sql = format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines {where_clause} ORDER BY {order}, rowid ASC"
    );

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), medicine_row_from_rusqlite)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medicine_from_row(row?)?);
    }
    Ok(meds)
}

pub fn count_medicines(conn: &Connection, filter: &MedicineFilter) -> Result<u32, DatabaseError> {
    let (where_clause, params_vec) = medicine_where_clause(filter);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM medicines {where_clause}"),
        param_refs.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

fn medicine_where_clause(filter: &MedicineFilter) -> (String, SqlParams) {
    let mut sql = String::from("WHERE 1=1");
    let mut params_vec = SqlParams::new();

    if let Some(active) = filter.active {
        let idx = bind(&mut params_vec, active as i32);
        sql.push_str(&format!(" AND is_active = ?{idx}"));
    }
    if filter.has_refill_date {
        sql.push_str(" AND refill_date IS NOT NULL");
    }
    if let Some(ref from) = filter.refill_from {
        let idx = bind(&mut params_vec, to_db_timestamp(from));
        sql.push_str(&format!(" AND refill_date >= ?{idx}"));
    }
    if let Some(ref until) = filter.refill_until {
        let idx = bind(&mut params_vec, to_db_timestamp(until));
        sql.push_str(&format!(" AND refill_date <= ?{idx}"));
    }
    if let Some(ref before) = filter.refill_before {
        let idx = bind(&mut params_vec, to_db_timestamp(before));
        sql.push_str(&format!(" AND refill_date < ?{idx}"));
    }
    if let Some(ref text) = filter.text {
        let idx = bind(&mut params_vec, like_pattern(text));
        sql.push_str(&format!(
            " AND (name LIKE ?{idx} ESCAPE '\\' OR category LIKE ?{idx} ESCAPE '\\')"
        ));
    }

    (sql, params_vec)
}

/// `%text%` with the LIKE wildcards in `text` matched literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// Internal row type for Medicine mapping
struct MedicineRow {
    id: String,
    name: String,
    dosage: String,
    dosage_form: String,
    frequency: String,
    category: Option<String>,
    prescribed_by: String,
    instructions: String,
    side_effects: String,
    quantity: i32,
    refill_date: Option<String>,
    created_at: String,
    is_active: i32,
}

fn medicine_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicineRow, rusqlite::Error> {
    Ok(MedicineRow {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage: row.get(2)?,
        dosage_form: row.get(3)?,
        frequency: row.get(4)?,
        category: row.get(5)?,
        prescribed_by: row.get(6)?,
        instructions: row.get(7)?,
        side_effects: row.get(8)?,
        quantity: row.get(9)?,
        refill_date: row.get(10)?,
        created_at: row.get(11)?,
        is_active: row.get(12)?,
    })
}

fn medicine_from_row(row: MedicineRow) -> Result<Medicine, DatabaseError> {
    Ok(Medicine {
        id: parse_uuid(&row.id)?,
        name: row.name,
        dosage: row.dosage,
        dosage_form: DosageForm::from_str(&row.dosage_form)?,
        frequency: Frequency::from(row.frequency),
        // Unrecognised labels are reported as missing and counted under "Unknown".
        category: row.category.and_then(|c| Category::from_str(&c).ok()),
        prescribed_by: row.prescribed_by,
        instructions: row.instructions,
        side_effects: row.side_effects,
        quantity: row.quantity,
        refill_date: row.refill_date.as_deref().map(from_db_timestamp).transpose()?,
        created_at: from_db_timestamp(&row.created_at)?,
        is_active: row.is_active != 0,
    })
}
