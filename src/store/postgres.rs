use bytes::BytesMut;
use tokio::task::JoinHandle;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::error::LoaderError;
use crate::store::{sql, Store};
use crate::types::{ColumnSchema, SqlValue};

/// PostgreSQL's wire protocol caps a statement at u16::MAX bind
/// parameters; batches wider than this are split into sub-statements
/// within the same transaction.
const MAX_PARAMETERS: usize = u16::MAX as usize;

/// PostgreSQL implementation of the store protocol over a single
/// tokio-postgres client. Transactions are driven with explicit
/// BEGIN/COMMIT/ROLLBACK so the loader's per-chunk commit and per-file
/// rollback map directly onto the protocol.
pub struct PostgresStore {
    client: Client,
    connection_task: JoinHandle<()>,
    in_transaction: bool,
}

impl PostgresStore {
    /// Connect to the configured database. A connection failure here is
    /// the one unrecoverable startup error; it propagates to the caller
    /// before any file is processed.
    pub async fn connect(config: &StoreConfig) -> Result<Self, LoaderError> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.database);

        let (client, connection) = pg_config.connect(NoTls).await?;
        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            client,
            connection_task,
            in_transaction: false,
        })
    }

    async fn ensure_transaction(&mut self) -> Result<(), LoaderError> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN").await?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl Store for PostgresStore {
    async fn table_exists(&mut self, table: &str) -> Result<bool, LoaderError> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1)",
                &[&table],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn create_table(
        &mut self,
        table: &str,
        schema: &ColumnSchema,
    ) -> Result<(), LoaderError> {
        // Table creation joins the first chunk's transaction: a failed
        // first chunk rolls the new table back with it.
        self.ensure_transaction().await?;
        let ddl = sql::create_table_statement(table, schema);
        debug!("Creating table: {}", ddl);
        self.client.batch_execute(&ddl).await?;
        Ok(())
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, LoaderError> {
        if rows.is_empty() || columns.is_empty() {
            return Ok(0);
        }
        self.ensure_transaction().await?;

        let rows_per_statement = (MAX_PARAMETERS / columns.len()).max(1);
        let mut inserted = 0u64;

        for batch in rows.chunks(rows_per_statement) {
            let statement = sql::insert_statement(table, columns, batch.len());
            let params: Vec<&(dyn ToSql + Sync)> = batch
                .iter()
                .flat_map(|row| row.iter().map(|value| value as &(dyn ToSql + Sync)))
                .collect();
            inserted += self.client.execute(statement.as_str(), &params).await?;
        }

        Ok(inserted)
    }

    async fn commit(&mut self) -> Result<(), LoaderError> {
        if self.in_transaction {
            self.client.batch_execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), LoaderError> {
        if self.in_transaction {
            self.client.batch_execute("ROLLBACK").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn close(self) -> Result<(), LoaderError> {
        let Self {
            client,
            connection_task,
            ..
        } = self;
        // Dropping the client terminates the connection; wait for the
        // driver task to drain.
        drop(client);
        let _ = connection_task.await;
        Ok(())
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(v) => v.to_sql(ty, out),
            SqlValue::Float(v) => v.to_sql(ty, out),
            SqlValue::Boolean(v) => v.to_sql(ty, out),
            SqlValue::DateTime(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Acceptance is checked per variant in to_sql; a variant bound
        // against an incompatible column type errors there.
        true
    }

    to_sql_checked!();
}
