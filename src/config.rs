use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoaderError;
use crate::types::{ImportJob, ManifestEntry};

/// Connection parameters for the target PostgreSQL store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

fn default_port() -> u16 {
    5432
}

/// Top-level loader configuration, deserialized from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Root directory for resolving manifest file names
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Rows per chunk; the only resource-control knob
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Target store connection parameters
    pub store: StoreConfig,
    /// Ordered (file, table) pairs to import
    #[serde(default = "default_manifest")]
    pub manifest: Vec<ManifestEntry>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_chunk_size() -> usize {
    1000
}

/// The e-commerce dataset this loader was built around.
fn default_manifest() -> Vec<ManifestEntry> {
    [
        ("customers.csv", "customers"),
        ("orders.csv", "orders"),
        ("sellers.csv", "sellers"),
        ("products.csv", "products"),
        ("payments.csv", "payments"),
        ("order_items.csv", "order_items"),
        ("geolocation.csv", "geolocation"),
    ]
    .iter()
    .map(|(file, table)| ManifestEntry::new(*file, *table))
    .collect()
}

impl LoaderConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LoaderError> {
        let contents = fs::read_to_string(path)?;
        let config: LoaderConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.chunk_size == 0 {
            return Err(LoaderError::config("chunk_size must be at least 1"));
        }
        for entry in &self.manifest {
            if entry.table.trim().is_empty() {
                return Err(LoaderError::config(format!(
                    "manifest entry for `{}` has an empty table name",
                    entry.file
                )));
            }
        }
        Ok(())
    }

    /// The ordered import job defined by this configuration.
    pub fn job(&self) -> ImportJob {
        ImportJob::new(self.manifest.clone())
    }

    /// Resolve a manifest file name against the source directory.
    pub fn resolve(&self, entry: &ManifestEntry) -> PathBuf {
        self.source_dir.join(&entry.file)
    }
}
