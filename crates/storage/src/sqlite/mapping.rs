use dojo_core::model::{PlaylistName, Technique, TechniqueName};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Map unique-constraint violations to `Conflict`, everything else to `Connection`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    conn(e)
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn technique_name(raw: String) -> Result<TechniqueName, StorageError> {
    TechniqueName::new(raw).map_err(ser)
}

pub(crate) fn playlist_name(raw: String) -> Result<PlaylistName, StorageError> {
    PlaylistName::new(raw).map_err(ser)
}

/// Technique lists are stored as JSON arrays of names.
pub(crate) fn names_to_json(names: &[TechniqueName]) -> Result<String, StorageError> {
    serde_json::to_string(names).map_err(ser)
}

pub(crate) fn names_from_json(raw: &str) -> Result<Vec<TechniqueName>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_technique_row(row: &sqlx::sqlite::SqliteRow) -> Result<Technique, StorageError> {
    let name = technique_name(row.try_get("name").map_err(ser)?)?;
    let number = u32_from_i64("number", row.try_get::<i64, _>("number").map_err(ser)?)?;
    let belt: String = row.try_get("belt").map_err(ser)?;
    let belt_number = u32_from_i64(
        "belt_number",
        row.try_get::<i64, _>("belt_number").map_err(ser)?,
    )?;
    let attack: String = row.try_get("attack").map_err(ser)?;
    let block: String = row.try_get("block").map_err(ser)?;
    let strike: String = row.try_get("strike").map_err(ser)?;
    let complete: bool = row.try_get("complete").map_err(ser)?;
    let link: String = row.try_get("link").map_err(ser)?;
    let kids: bool = row.try_get("kids").map_err(ser)?;
    let adults: Option<String> = row.try_get("adults").map_err(ser)?;

    Ok(Technique::new(name, number, belt, belt_number)
        .with_facets(attack, block, strike)
        .with_complete(complete)
        .with_link(link)
        .with_kids(kids)
        .with_adults(adults))
}
