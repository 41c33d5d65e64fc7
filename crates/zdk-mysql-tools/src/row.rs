//! Conversion of MySQL result rows to JSON

use crate::error::DatabaseToolError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::mysql::types::MySqlTime;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

/// One result row: column name to value, in column order
pub type Row = Map<String, Value>;

/// How a column's values are mapped to JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    Binary,
    Text,
}

impl ColumnKind {
    /// Classify a MySQL type name as reported by the driver
    pub fn of(type_name: &str) -> Self {
        let unsigned = type_name.ends_with(" UNSIGNED");

        match type_name.trim_end_matches(" UNSIGNED") {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                if unsigned {
                    Self::Unsigned
                } else {
                    Self::Signed
                }
            }
            "FLOAT" | "DOUBLE" => Self::Float,
            "DECIMAL" => Self::Decimal,
            "DATE" => Self::Date,
            "DATETIME" | "TIMESTAMP" => Self::DateTime,
            "TIME" => Self::Time,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => Self::Binary,
            _ => Self::Text,
        }
    }
}

/// Convert a result row into a JSON object
///
/// Works for rows read over either the text protocol (plain statements) or
/// the binary protocol (prepared `CALL`): every value goes through the
/// driver's typed decoder for its column type. Integers, floating point and
/// decimal columns become JSON numbers, temporal columns are formatted as
/// MySQL prints them, binary columns are kept as UTF-8 when possible and
/// base64 otherwise, and everything else (text, JSON, enum, set) is a string.
pub fn mysql_row_to_json(row: &MySqlRow) -> Result<Row, DatabaseToolError> {
    let mut map = Map::with_capacity(row.columns().len());

    for column in row.columns() {
        let ordinal = column.ordinal();
        let name = column.name().to_string();
        let type_name = column.type_info().name();

        if row.try_get_raw(ordinal)?.is_null() {
            map.insert(name, Value::Null);
            continue;
        }

        let value = decode_value(row, ordinal, ColumnKind::of(type_name)).map_err(|e| {
            DatabaseToolError::Database(format!(
                "Failed to read column '{}' ({}): {}",
                name, type_name, e
            ))
        })?;

        map.insert(name, value);
    }

    Ok(map)
}

fn decode_value(row: &MySqlRow, ordinal: usize, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    let value = match kind {
        ColumnKind::Signed => Value::from(row.try_get_unchecked::<i64, _>(ordinal)?),
        ColumnKind::Unsigned => Value::from(row.try_get_unchecked::<u64, _>(ordinal)?),
        ColumnKind::Float => float(row.try_get_unchecked::<f64, _>(ordinal)?),
        ColumnKind::Decimal => decimal(row.try_get_unchecked::<String, _>(ordinal)?),
        // Zero dates have no chrono form; keep whatever the server sent
        ColumnKind::Date => match row.try_get_unchecked::<NaiveDate, _>(ordinal) {
            Ok(date) => Value::String(date.to_string()),
            Err(_) => raw(row, ordinal)?,
        },
        ColumnKind::DateTime => match row.try_get_unchecked::<NaiveDateTime, _>(ordinal) {
            Ok(datetime) => Value::String(datetime.to_string()),
            Err(_) => raw(row, ordinal)?,
        },
        ColumnKind::Time => Value::String(row.try_get_unchecked::<MySqlTime, _>(ordinal)?.to_string()),
        ColumnKind::Binary | ColumnKind::Text => raw(row, ordinal)?,
    };

    Ok(value)
}

/// UTF-8 text when the bytes allow it, base64 otherwise
fn raw(row: &MySqlRow, ordinal: usize) -> Result<Value, sqlx::Error> {
    let bytes: Vec<u8> = row.try_get_unchecked(ordinal)?;
    Ok(bytes_to_json(bytes))
}

pub fn bytes_to_json(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::String(BASE64.encode(e.into_bytes())),
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// DECIMAL arrives as text in both protocols
pub fn decimal(text: String) -> Value {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}
