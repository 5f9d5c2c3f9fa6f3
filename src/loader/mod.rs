// Import driver: file-by-file, chunk-by-chunk, failures isolated per file
pub mod runner;


pub use runner::{FileOutcome, Loader, RunSummary};
