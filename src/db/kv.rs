//! Key/value access to the `kv_store` table. Values are JSON documents.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::DatabaseError;

/// Get a raw value by key. Returns None if not set.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    match stmt.query_row([key], |row| row.get::<_, String>(0)) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

/// Set a raw value (upsert).
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Get and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, DatabaseError> {
    match get_value(conn, key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| DatabaseError::Serialization { key: key.into(), source }),
    }
}

/// Encode and store a JSON value.
pub fn set_json<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<(), DatabaseError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| DatabaseError::Serialization { key: key.into(), source })?;
    set_value(conn, key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn missing_key_is_none() {
        let conn = open_memory_database().unwrap();
        assert_eq!(get_value(&conn, "nope").unwrap(), None);
    }

    #[test]
    fn set_then_overwrite() {
        let conn = open_memory_database().unwrap();
        set_value(&conn, "k", "1").unwrap();
        set_value(&conn, "k", "2").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn json_round_trip() {
        let conn = open_memory_database().unwrap();
        set_json(&conn, "nums", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = get_json(&conn, "nums").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn corrupt_json_is_reported() {
        let conn = open_memory_database().unwrap();
        set_value(&conn, "bad", "{not json").unwrap();
        let result: Result<Option<Vec<i32>>, _> = get_json(&conn, "bad");
        assert!(matches!(result, Err(DatabaseError::Serialization { .. })));
    }
}
