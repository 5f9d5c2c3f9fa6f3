// Chunked CSV reading with null and column-name normalization
pub mod reader;


pub use reader::{ChunkReader, RawChunk};
