//! SQL helpers shared by the stores and the index extensions.

use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};

use indexsync_protocols::IndexError;

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `^[A-Za-z_][A-Za-z0-9_]*$`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_identifier(name: &str) -> Result<(), IndexError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(IndexError::validation(format!("invalid identifier '{}'", name)))
    }
}

/// Whether a table, view or virtual table with this name exists.
pub fn table_exists(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1)",
        [name],
        |row| row.get(0),
    )
}

/// Convert a SQL value to JSON without schema knowledge. Blobs map to null.
pub fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Convert a result row to a JSON object keyed by column name.
pub fn row_to_json(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Map<String, Value>> {
    let mut object = Map::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        object.insert(name.clone(), sql_to_json(row.get_ref(i)?));
    }
    Ok(object)
}

/// Column names of a prepared statement, owned.
pub fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

#[cfg(test)]
#[path = "sql_tests.rs"]
mod tests;
