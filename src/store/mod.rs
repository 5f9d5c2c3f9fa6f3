// Store protocol and the PostgreSQL backend
pub mod postgres;
pub mod sql;


pub use postgres::PostgresStore;

use crate::error::LoaderError;
use crate::types::{ColumnSchema, SqlValue};

/// Relational store protocol required by the loader.
///
/// Any backend providing idempotent table creation, one batched
/// parameterized insert per chunk, and explicit transaction control is
/// substitutable. The loader holds the one open handle for the whole
/// run and closes it exactly once at the end.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn table_exists(&mut self, table: &str) -> Result<bool, LoaderError>;

    async fn create_table(
        &mut self,
        table: &str,
        schema: &ColumnSchema,
    ) -> Result<(), LoaderError>;

    /// Insert all rows of one chunk in a single batched call. Returns
    /// the number of rows inserted.
    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, LoaderError>;

    async fn commit(&mut self) -> Result<(), LoaderError>;

    async fn rollback(&mut self) -> Result<(), LoaderError>;

    async fn close(self) -> Result<(), LoaderError>;
}
