use crate::csv_reader::RawChunk;
use crate::types::{parse_boolean, parse_datetime, ColumnDef, ColumnSchema, SqlType};

/// Infers a per-column SQL type from the sampled values of one chunk.
///
/// Inference runs once per table, on the first chunk of a file; later
/// chunks are converted against the resulting schema and never refine
/// it. Ambiguous columns fall back to TEXT rather than erroring.
pub struct SchemaInferrer;

impl SchemaInferrer {
    pub fn new() -> Self {
        Self
    }

    /// Build a column schema from normalized header names and the first
    /// chunk of data.
    pub fn infer(&self, columns: &[String], chunk: &RawChunk) -> ColumnSchema {
        let defs = columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let sql_type = self.classify(chunk.column_values(index));
                ColumnDef::new(name.clone(), sql_type)
            })
            .collect();
        ColumnSchema::new(defs)
    }

    /// Classify a column from its non-null sampled values.
    ///
    /// The checks cascade from most to least specific: INTEGER when
    /// every value parses as i64, FLOAT when every value parses as f64
    /// (at least one of them having failed the integer parse), BOOLEAN
    /// for strict true/false literals, DATETIME for the supported
    /// date/time formats, TEXT otherwise. An all-null sample is TEXT.
    fn classify<'a>(&self, values: impl Iterator<Item = &'a str>) -> SqlType {
        let values: Vec<&str> = values.collect();
        if values.is_empty() {
            return SqlType::Text;
        }

        if values.iter().all(|v| v.trim().parse::<i64>().is_ok()) {
            return SqlType::Integer;
        }
        if values.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
            return SqlType::Float;
        }
        if values.iter().all(|v| parse_boolean(v).is_some()) {
            return SqlType::Boolean;
        }
        if values.iter().all(|v| parse_datetime(v).is_some()) {
            return SqlType::DateTime;
        }
        SqlType::Text
    }
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}
