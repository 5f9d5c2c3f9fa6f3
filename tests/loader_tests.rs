//! End-to-end loader tests over an in-memory store and real CSV files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use csvload::error::LoaderError;
use csvload::loader::Loader;
use csvload::store::Store;
use csvload::types::{ColumnSchema, ImportJob, ManifestEntry, SqlType, SqlValue};

#[derive(Default)]
struct RecordingState {
    existing: HashSet<String>,
    created: Vec<(String, ColumnSchema)>,
    committed: HashMap<String, Vec<Vec<SqlValue>>>,
    pending: HashMap<String, Vec<Vec<SqlValue>>>,
    insert_calls: usize,
    commit_calls: usize,
    rollback_calls: usize,
    closed: bool,
    fail_on_insert_call: Option<usize>,
}

/// Store double with real transaction semantics: inserts are pending
/// until commit; rollback discards them.
#[derive(Clone, Default)]
struct RecordingStore {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingStore {
    fn table_rows(&self, table: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .committed
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

impl Store for RecordingStore {
    async fn table_exists(&mut self, table: &str) -> Result<bool, LoaderError> {
        Ok(self.state.lock().unwrap().existing.contains(table))
    }

    async fn create_table(
        &mut self,
        table: &str,
        schema: &ColumnSchema,
    ) -> Result<(), LoaderError> {
        let mut state = self.state.lock().unwrap();
        state.created.push((table.to_string(), schema.clone()));
        state.existing.insert(table.to_string());
        Ok(())
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, LoaderError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_on_insert_call == Some(state.insert_calls) {
            return Err(LoaderError::config("constraint violation"));
        }
        for row in rows {
            assert_eq!(row.len(), columns.len(), "row width must match column list");
        }
        state
            .pending
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), LoaderError> {
        let mut state = self.state.lock().unwrap();
        state.commit_calls += 1;
        let pending: Vec<(String, Vec<Vec<SqlValue>>)> = state.pending.drain().collect();
        for (table, rows) in pending {
            state.committed.entry(table).or_default().extend(rows);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), LoaderError> {
        let mut state = self.state.lock().unwrap();
        state.rollback_calls += 1;
        state.pending.clear();
        Ok(())
    }

    async fn close(self) -> Result<(), LoaderError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

fn write_customers_csv(dir: &TempDir, rows: usize) {
    let mut contents = String::from("id,first name,signup-date\n");
    for i in 0..rows {
        contents.push_str(&format!("{},customer{},2024-01-01\n", i, i));
    }
    fs::write(dir.path().join("customers.csv"), contents).unwrap();
}

/// The full scenario: 2500 rows at chunk size 1000 land in 3 chunks
/// with 3 commits, into a table with normalized column names.
#[tokio::test]
async fn test_customers_2500_rows_three_chunks() {
    let dir = TempDir::new().unwrap();
    write_customers_csv(&dir, 2500);

    let job = ImportJob::new(vec![ManifestEntry::new("customers.csv", "customers")]);
    let store = RecordingStore::default();
    let loader = Loader::new(store.clone(), dir.path(), 1000);

    let summary = loader.run(&job).await.unwrap();
    assert_eq!(summary.imported_files(), 1);
    assert_eq!(summary.total_rows(), 2500);
    assert!(summary.is_successful());

    let state = store.state.lock().unwrap();
    assert_eq!(state.insert_calls, 3);
    assert_eq!(state.commit_calls, 3);
    assert!(state.closed);

    let (table, schema) = &state.created[0];
    assert_eq!(table, "customers");
    assert_eq!(
        schema.column_names(),
        vec!["id", "first_name", "signup_date"]
    );
    assert_eq!(schema.columns[0].sql_type, SqlType::Integer);
    assert_eq!(schema.columns[2].sql_type, SqlType::DateTime);
    assert_eq!(state.committed.get("customers").unwrap().len(), 2500);
}

/// Constraint violation during chunk 2: chunk 1 stays committed, chunks
/// 2 and 3 are never inserted, and the next manifest file still runs.
#[tokio::test]
async fn test_constraint_violation_in_second_chunk() {
    let dir = TempDir::new().unwrap();
    write_customers_csv(&dir, 2500);
    fs::write(dir.path().join("orders.csv"), "order_id\n1\n2\n").unwrap();

    let job = ImportJob::new(vec![
        ManifestEntry::new("customers.csv", "customers"),
        ManifestEntry::new("orders.csv", "orders"),
    ]);

    let store = RecordingStore::default();
    store.state.lock().unwrap().fail_on_insert_call = Some(2);

    let summary = Loader::new(store.clone(), dir.path(), 1000)
        .run(&job)
        .await
        .unwrap();

    assert_eq!(summary.failed_files(), 1);
    assert_eq!(summary.imported_files(), 1);
    assert!(summary.is_successful());

    assert_eq!(store.table_rows("customers"), 1000);
    assert_eq!(store.table_rows("orders"), 2);

    let state = store.state.lock().unwrap();
    assert_eq!(state.rollback_calls, 1);
    assert!(state.closed);
}

/// Re-running against an already-populated store reuses the existing
/// table and appends rows; no "table already exists" error.
#[tokio::test]
async fn test_rerun_appends_without_table_creation_error() {
    let dir = TempDir::new().unwrap();
    write_customers_csv(&dir, 10);
    let job = ImportJob::new(vec![ManifestEntry::new("customers.csv", "customers")]);

    let store = RecordingStore::default();

    let first = Loader::new(store.clone(), dir.path(), 1000);
    first.run(&job).await.unwrap();
    let second = Loader::new(store.clone(), dir.path(), 1000);
    let summary = second.run(&job).await.unwrap();

    assert!(summary.is_successful());
    let state = store.state.lock().unwrap();
    // Table created on the first run only.
    assert_eq!(state.created.len(), 1);
    // Duplicate-row suppression is out of scope: rows are appended.
    assert_eq!(state.committed.get("customers").unwrap().len(), 20);
}

/// Full manifest ordering: files are processed in manifest order and a
/// missing file in the middle does not disturb the rest.
#[tokio::test]
async fn test_manifest_order_preserved_with_missing_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.csv"), "v\n1\n").unwrap();
    fs::write(dir.path().join("c.csv"), "v\n2\n").unwrap();

    let job = ImportJob::new(vec![
        ManifestEntry::new("a.csv", "a"),
        ManifestEntry::new("b.csv", "b"),
        ManifestEntry::new("c.csv", "c"),
    ]);

    let store = RecordingStore::default();
    let summary = Loader::new(store.clone(), dir.path(), 1000)
        .run(&job)
        .await
        .unwrap();

    assert_eq!(summary.imported_files(), 2);
    assert_eq!(summary.skipped_files(), 1);

    let state = store.state.lock().unwrap();
    let created: Vec<&str> = state.created.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(created, vec!["a", "c"]);
}

/// Mixed value types in the sampled chunk fall back to TEXT and import
/// cleanly as text.
#[tokio::test]
async fn test_mixed_column_falls_back_to_text() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("m.csv"), "v\n1\nhello\ntrue\n").unwrap();

    let store = RecordingStore::default();
    let summary = Loader::new(store.clone(), dir.path(), 1000)
        .run(&ImportJob::new(vec![ManifestEntry::new("m.csv", "m")]))
        .await
        .unwrap();

    assert_eq!(summary.total_rows(), 3);
    let state = store.state.lock().unwrap();
    assert_eq!(state.created[0].1.columns[0].sql_type, SqlType::Text);
    let rows = state.committed.get("m").unwrap();
    assert_eq!(rows[0][0], SqlValue::Text("1".to_string()));
}
