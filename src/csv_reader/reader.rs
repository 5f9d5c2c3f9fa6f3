use std::fs::File;
use std::path::Path;

use crate::error::LoaderError;
use crate::schema::normalize_column_name;

/// Cell markers treated as missing values and normalized to NULL.
const NA_MARKERS: &[&str] = &["", "NaN", "nan", "null", "NULL", "N/A", "NA"];

/// A bounded batch of null-normalized rows read from one source file.
/// Rows hold raw string cells; typing happens later against the
/// inferred schema.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawChunk {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-null values of one column, in row order. Used by schema
    /// inference to sample a column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).and_then(|cell| cell.as_deref()))
    }
}

/// Streams a CSV file as a sequence of fixed-size chunks. The header row
/// is read eagerly at open time and its column names normalized, so
/// every chunk of the file sees the same column identifiers.
pub struct ChunkReader {
    reader: csv::Reader<File>,
    columns: Vec<String>,
    chunk_size: usize,
    done: bool,
}

impl ChunkReader {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, LoaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let columns = reader
            .headers()?
            .iter()
            .map(normalize_column_name)
            .collect();

        Ok(Self {
            reader,
            columns,
            chunk_size,
            done: false,
        })
    }

    /// Normalized column names from the header row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Read the next chunk of up to `chunk_size` rows. Returns `None`
    /// once the file is exhausted. A malformed record (ragged row,
    /// invalid UTF-8) surfaces as an error and ends the stream.
    pub fn next_chunk(&mut self) -> Result<Option<RawChunk>, LoaderError> {
        if self.done {
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(self.chunk_size);
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut record)? {
                self.done = true;
                break;
            }
            rows.push(record.iter().map(normalize_cell).collect());
        }

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RawChunk { rows }))
        }
    }
}

/// Null normalization: missing-value markers become `None`, everything
/// else is kept verbatim.
fn normalize_cell(cell: &str) -> Option<String> {
    if NA_MARKERS.contains(&cell.trim()) {
        None
    } else {
        Some(cell.to_string())
    }
}
