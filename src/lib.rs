pub mod config;
pub mod csv_reader;
pub mod error;
pub mod loader;
pub mod schema;
pub mod store;
pub mod types;
