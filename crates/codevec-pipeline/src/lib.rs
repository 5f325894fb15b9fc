//! codevec-pipeline
//!
//! Orchestration over injected `Embedder` and `VectorStore` handles:
//! collection bootstrap, per-file indexing and similarity search.

pub mod bootstrap;
pub mod indexer;
pub mod searcher;

pub use bootstrap::ensure_collection;
pub use indexer::Indexer;
pub use searcher::{Searcher, DEFAULT_LIMIT};
