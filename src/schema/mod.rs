// Column-name normalization and first-chunk schema inference
pub mod inference;
pub mod normalizer;


pub use inference::SchemaInferrer;
pub use normalizer::normalize_column_name;
