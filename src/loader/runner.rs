use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::csv_reader::{ChunkReader, RawChunk};
use crate::error::LoaderError;
use crate::schema::SchemaInferrer;
use crate::store::Store;
use crate::types::{ColumnSchema, ImportJob, ManifestEntry, SqlValue};

/// Terminal state of one manifest entry after a run
#[derive(Debug)]
pub enum FileOutcome {
    /// File fully imported; rows and chunk count for the log
    Imported {
        file: String,
        table: String,
        rows: u64,
        chunks: u32,
    },
    /// Source file missing on disk; not an error
    Skipped { file: String },
    /// Processing aborted mid-file; chunks committed before the error
    /// remain in the store
    Failed {
        file: String,
        table: String,
        error: LoaderError,
    },
}

impl FileOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, FileOutcome::Imported { .. })
    }
}

/// Aggregated per-file results of one run. The caller derives the
/// process exit code from this instead of relying on exceptions.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn imported_files(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_imported()).count()
    }

    pub fn skipped_files(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed_files(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn total_rows(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                FileOutcome::Imported { rows, .. } => *rows,
                _ => 0,
            })
            .sum()
    }

    /// Partial success still counts as success; the run is a failure
    /// only when a non-empty manifest produced no imported file at all.
    pub fn is_successful(&self) -> bool {
        self.outcomes.is_empty() || self.imported_files() > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} imported, {} skipped, {} failed, {} rows inserted",
            self.imported_files(),
            self.skipped_files(),
            self.failed_files(),
            self.total_rows()
        )
    }
}

/// Drives an import job to completion against an open store handle.
///
/// Strictly sequential: one file at a time, one chunk at a time. The
/// store handle is owned for the duration of the run and closed exactly
/// once at the end, whatever the per-file outcomes were.
pub struct Loader<S: Store> {
    store: S,
    source_dir: PathBuf,
    chunk_size: usize,
}

impl<S: Store> Loader<S> {
    pub fn new(store: S, source_dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            store,
            source_dir: source_dir.into(),
            chunk_size,
        }
    }

    /// Process every manifest entry in order. Per-file errors are
    /// caught here, rolled back, and recorded; only the final close can
    /// propagate an error out of the run.
    pub async fn run(mut self, job: &ImportJob) -> Result<RunSummary, LoaderError> {
        let mut summary = RunSummary::default();

        for entry in &job.entries {
            let path = self.source_dir.join(&entry.file);
            info!("Processing file: {}", path.display());

            if !path.exists() {
                warn!("File not found: {}. Skipping...", path.display());
                summary.record(FileOutcome::Skipped {
                    file: entry.file.clone(),
                });
                continue;
            }

            match self.import_file(&path, entry).await {
                Ok((rows, chunks)) => {
                    info!(
                        "Imported {} rows from {} into `{}` in {} chunks",
                        rows, entry.file, entry.table, chunks
                    );
                    summary.record(FileOutcome::Imported {
                        file: entry.file.clone(),
                        table: entry.table.clone(),
                        rows,
                        chunks,
                    });
                }
                Err(e) => {
                    error!("Error processing {}: {}", entry.file, e);
                    if let Err(rollback_err) = self.store.rollback().await {
                        error!(
                            "Rollback failed after error in {}: {}",
                            entry.file, rollback_err
                        );
                    }
                    summary.record(FileOutcome::Failed {
                        file: entry.file.clone(),
                        table: entry.table.clone(),
                        error: e,
                    });
                }
            }
        }

        self.store.close().await?;
        Ok(summary)
    }

    /// Import one file: infer the schema from the first chunk, create
    /// the table if absent, then insert and commit chunk by chunk.
    async fn import_file(
        &mut self,
        path: &Path,
        entry: &ManifestEntry,
    ) -> Result<(u64, u32), LoaderError> {
        let mut reader = ChunkReader::open(path, self.chunk_size)?;
        let columns: Vec<String> = reader.columns().to_vec();

        let first = match reader.next_chunk()? {
            Some(chunk) => chunk,
            None => {
                info!("No data rows in {}; nothing to import", entry.file);
                return Ok((0, 0));
            }
        };

        // Schema is sampled from the first chunk only and never
        // revisited; a later chunk that does not fit it fails the file.
        let schema = SchemaInferrer::new().infer(&columns, &first);
        if !self.store.table_exists(&entry.table).await? {
            self.store.create_table(&entry.table, &schema).await?;
        }

        let mut rows_inserted = 0u64;
        let mut chunks = 0u32;
        let mut current = Some(first);

        while let Some(raw) = current {
            rows_inserted += self.insert_chunk(entry, &columns, &schema, &raw).await?;
            chunks += 1;
            info!(
                "Processed a chunk of {} into table `{}`",
                entry.file, entry.table
            );
            current = reader.next_chunk()?;
        }

        Ok((rows_inserted, chunks))
    }

    /// Convert one raw chunk to typed rows, insert it as a single
    /// batched call, and commit.
    async fn insert_chunk(
        &mut self,
        entry: &ManifestEntry,
        columns: &[String],
        schema: &ColumnSchema,
        raw: &RawChunk,
    ) -> Result<u64, LoaderError> {
        let typed: Vec<Vec<SqlValue>> = raw
            .rows
            .iter()
            .map(|row| schema.convert_row(row))
            .collect::<Result<_, _>>()?;

        let inserted = self
            .store
            .execute_batch_insert(&entry.table, columns, &typed)
            .await?;
        self.store.commit().await?;
        Ok(inserted)
    }
}
