use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LoaderError;

/// SQL column types the loader can infer from sampled CSV data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// Whole numbers (stored as BIGINT)
    Integer,
    /// Real numbers (stored as DOUBLE PRECISION)
    Float,
    /// Strict true/false values
    Boolean,
    /// Timestamps and dates (stored as TIMESTAMP)
    DateTime,
    /// Everything else
    Text,
}

impl SqlType {
    /// PostgreSQL type name used in CREATE TABLE statements.
    ///
    /// INTEGER maps to BIGINT because inferred whole numbers are parsed
    /// as i64 and bound as 8-byte parameters.
    pub fn sql_name(&self) -> &'static str {
        match self {
            SqlType::Integer => "BIGINT",
            SqlType::Float => "DOUBLE PRECISION",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "TIMESTAMP",
            SqlType::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "DATETIME",
            SqlType::Text => "TEXT",
        };
        f.write_str(tag)
    }
}

/// A single cell value, typed at parse time according to the column's
/// inferred type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Text(String),
    Null,
}

/// Timestamp formats accepted for DATETIME columns. `%.f` also matches
/// values without a fractional part.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a datetime string in one of the supported formats. Date-only
/// values get a midnight time component.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Parse a strict boolean literal.
pub fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

impl SqlValue {
    /// Parse a raw CSV cell according to the column's inferred type.
    pub fn parse(raw: &str, column: &ColumnDef) -> Result<SqlValue, LoaderError> {
        let mismatch = || LoaderError::type_mismatch(&column.name, raw, column.sql_type);
        match column.sql_type {
            SqlType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| mismatch()),
            SqlType::Float => raw
                .trim()
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|_| mismatch()),
            SqlType::Boolean => parse_boolean(raw)
                .map(SqlValue::Boolean)
                .ok_or_else(mismatch),
            SqlType::DateTime => parse_datetime(raw)
                .map(SqlValue::DateTime)
                .ok_or_else(mismatch),
            SqlType::Text => Ok(SqlValue::Text(raw.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// A single column of an inferred table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Normalized column name
    pub name: String,
    /// Inferred storage type
    pub sql_type: SqlType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Ordered per-table mapping of column name to inferred storage type.
/// Computed once from the first chunk of a file and reused for every
/// later chunk of that file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert one null-normalized raw row into typed values, cell by
    /// cell against this schema.
    pub fn convert_row(&self, row: &[Option<String>]) -> Result<Vec<SqlValue>, LoaderError> {
        if row.len() != self.columns.len() {
            return Err(LoaderError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        row.iter()
            .zip(&self.columns)
            .map(|(cell, column)| match cell {
                None => Ok(SqlValue::Null),
                Some(raw) => SqlValue::parse(raw, column),
            })
            .collect()
    }
}

/// One manifest entry: a source file name and its target table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// CSV file name, resolved against the configured source directory
    pub file: String,
    /// Target table name in the store
    pub table: String,
}

impl ManifestEntry {
    pub fn new(file: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            table: table.into(),
        }
    }
}

/// The ordered set of (source file, target table) pairs for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub entries: Vec<ManifestEntry>,
}

impl ImportJob {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
