use crate::categories::CategorySet;
use crate::errors::ScraperError;
use crate::holiday_extractor::HolidayRecord;
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS holidays (
    id INTEGER PRIMARY KEY,
    order_number INTEGER NOT NULL,
    date TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE (date, order_number)
);

CREATE TABLE IF NOT EXISTS holiday_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS holiday_category_links (
    holiday_id INTEGER NOT NULL REFERENCES holidays(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES holiday_categories(id) ON DELETE CASCADE,
    PRIMARY KEY (holiday_id, category_id)
);
";

/// Replace all stored holidays with `records` in a single transaction.
///
/// Categories are only ever added, so labels from earlier runs stay.
pub fn save_records(
    conn: &mut Connection,
    categories: &CategorySet,
    records: &[HolidayRecord],
) -> Result<(), ScraperError> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.execute("DELETE FROM holiday_category_links", [])?;
    tx.execute("DELETE FROM holidays", [])?;

    for label in categories.iter() {
        tx.execute(
            "INSERT OR IGNORE INTO holiday_categories (name) VALUES (?1)",
            params![label],
        )?;
    }

    for record in records {
        tx.execute(
            "INSERT INTO holidays (order_number, date, name) VALUES (?1, ?2, ?3)",
            params![record.ordinal, record.iso_date(), record.name],
        )?;
        let holiday_id = tx.last_insert_rowid();

        for category in &record.categories {
            tx.execute(
                "INSERT OR IGNORE INTO holiday_categories (name) VALUES (?1)",
                params![category],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO holiday_category_links (holiday_id, category_id)
                 SELECT ?1, id FROM holiday_categories WHERE name = ?2",
                params![holiday_id, category],
            )?;
        }
    }

    tx.commit()?;
    info!("Saved {} holidays to SQLite", records.len());
    Ok(())
}

/// Read stored holidays back, ordered by date then ordinal.
pub fn load_records(conn: &Connection) -> Result<Vec<HolidayRecord>, ScraperError> {
    let mut stmt = conn.prepare(
        "SELECT h.id, h.order_number, h.date, h.name, c.name
         FROM holidays h
         LEFT JOIN holiday_category_links l ON l.holiday_id = h.id
         LEFT JOIN holiday_categories c ON c.id = l.category_id
         ORDER BY h.date, h.order_number, l.rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut records: Vec<HolidayRecord> = Vec::new();
    let mut last_id = None;
    for row in rows {
        let (id, ordinal, date, name, category) = row?;
        if last_id != Some(id) {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|err| {
                ScraperError::CustomError(format!("Bad stored date '{}': {}", date, err))
            })?;
            records.push(HolidayRecord {
                ordinal,
                date,
                name,
                categories: Vec::new(),
            });
            last_id = Some(id);
        }
        if let (Some(category), Some(record)) = (category, records.last_mut()) {
            record.categories.push(category);
        }
    }

    Ok(records)
}
