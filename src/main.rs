use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn, Level};

use csvload::config::LoaderConfig;
use csvload::csv_reader::ChunkReader;
use csvload::error::LoaderError;
use csvload::loader::{Loader, RunSummary};
use csvload::schema::SchemaInferrer;
use csvload::store::{sql, PostgresStore};

#[derive(Parser)]
#[command(name = "csvload")]
#[command(about = "Chunked CSV to PostgreSQL batch loader with schema inference")]
#[command(version = "0.1.0")]
#[command(long_about = "Csvload imports a fixed manifest of CSV files into PostgreSQL. Each file is streamed in fixed-size row chunks; column types are inferred from the first chunk, tables are created on demand, and every chunk is inserted as one batched statement with a commit per chunk. Failures are isolated per file.")]
#[command(after_help = "EXAMPLES:
    # Import every manifest file using a JSON config
    csvload run -c import.json

    # Override the source directory and chunk size
    csvload run -c import.json --source-dir /data/ecommerce --chunk-size 500

    # Preview the inferred CREATE TABLE statements without importing
    csvload plan -c import.json -o schema.sql")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import every manifest file into PostgreSQL
    #[command(long_about = "Run the full import: for each (file, table) pair of the manifest, stream the file in chunks, infer the schema from the first chunk, create the table if absent, and batch-insert with a commit per chunk. A file that is missing is skipped with a warning; a file that errors is rolled back and the run continues with the next one.")]
    Run {
        /// Path to the JSON configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Override the configured source directory
        #[arg(long, value_name = "DIR")]
        source_dir: Option<PathBuf>,

        /// Override the configured rows-per-chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Infer schemas and print the CREATE TABLE DDL without importing
    #[command(long_about = "Read the first chunk of each manifest file, infer column types, and emit the CREATE TABLE statements the run command would issue. Useful for reviewing the inferred schema before touching the store. Missing files are warned about and skipped.")]
    Plan {
        /// Path to the JSON configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Write the DDL to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    info!("Starting csvload v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            config,
            source_dir,
            chunk_size,
        } => {
            let mut config = LoaderConfig::from_file(&config)?;
            if let Some(dir) = source_dir {
                config.source_dir = dir;
            }
            if let Some(size) = chunk_size {
                config.chunk_size = size;
            }
            config.validate()?;

            let summary = execute_run_pipeline(&config).await?;
            info!("Run finished: {}", summary.summary());

            if !summary.is_successful() {
                eprintln!("Import failed: no file was imported");
                std::process::exit(1);
            }
        }
        Commands::Plan { config, output } => {
            let config = LoaderConfig::from_file(&config)?;
            let ddl = execute_plan_pipeline(&config)?;

            match output {
                Some(path) => {
                    fs::write(&path, ddl)?;
                    info!("DDL written to: {:?}", path);
                }
                None => print!("{}", ddl),
            }
        }
    }

    Ok(())
}

/// Connect the store, run the loader over the configured manifest, and
/// return the per-file summary. A connection failure here aborts before
/// any file is touched.
async fn execute_run_pipeline(config: &LoaderConfig) -> Result<RunSummary, LoaderError> {
    info!(
        "Importing {} files from {} (chunk size {})",
        config.manifest.len(),
        config.source_dir.display(),
        config.chunk_size
    );

    let store = PostgresStore::connect(&config.store).await?;
    info!(
        "Connected to PostgreSQL database `{}` on {}:{}",
        config.store.database, config.store.host, config.store.port
    );

    let loader = Loader::new(store, config.source_dir.clone(), config.chunk_size);
    loader.run(&config.job()).await
}

/// Infer a schema from the first chunk of each manifest file and render
/// the CREATE TABLE statements the run would issue.
fn execute_plan_pipeline(config: &LoaderConfig) -> Result<String, LoaderError> {
    let inferrer = SchemaInferrer::new();
    let mut ddl = String::new();

    for entry in &config.manifest {
        let path = config.resolve(entry);
        if !path.exists() {
            warn!("File not found: {}. Skipping...", path.display());
            continue;
        }

        let mut reader = ChunkReader::open(&path, config.chunk_size)?;
        let columns = reader.columns().to_vec();
        match reader.next_chunk()? {
            Some(chunk) => {
                let schema = inferrer.infer(&columns, &chunk);
                ddl.push_str(&sql::create_table_statement(&entry.table, &schema));
                ddl.push_str(";\n");
            }
            None => {
                warn!("No data rows in {}; no DDL emitted", entry.file);
            }
        }
    }

    Ok(ddl)
}

/// Initialize logging based on CLI configuration
fn initialize_logging(cli: &Cli) -> Result<()> {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .init();
    }

    Ok(())
}
