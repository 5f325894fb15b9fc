//! codevec-core
//!
//! Data model, error taxonomy, configuration, chunking and source discovery
//! shared by the embedding, storage and pipeline crates.

pub mod chunker;
pub mod config;
pub mod error;
pub mod source;
pub mod traits;
pub mod types;

pub use chunker::Chunker;
pub use error::{ChunkingError, EmbeddingError, Error, Result, StoreError, StoreOp};
pub use traits::{Embedder, VectorStore};
