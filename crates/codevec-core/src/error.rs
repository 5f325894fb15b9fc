use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("indexing {path} failed: {source}")]
    IndexFile {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of an embedding provider call.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Transport(String),

    #[error("embedding request timed out after {0}s")]
    Timeout(u64),

    #[error("embedding provider rejected credentials (HTTP {0})")]
    Auth(u16),

    #[error("embedding provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// The vector store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    CollectionExists,
    CreateCollection,
    Upsert,
    Search,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::CollectionExists => "collection_exists",
            StoreOp::CreateCollection => "create_collection",
            StoreOp::Upsert => "upsert",
            StoreOp::Search => "search",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("vector store {op} on '{collection}' failed: {source}")]
pub struct StoreError {
    pub op: StoreOp,
    pub collection: String,
    #[source]
    pub source: BoxError,
}

impl StoreError {
    pub fn new(op: StoreOp, collection: &str, source: impl Into<BoxError>) -> Self {
        Self { op, collection: collection.to_string(), source: source.into() }
    }

    /// Shorthand for validation failures that carry only a message.
    pub fn invalid(op: StoreOp, collection: &str, msg: impl Into<String>) -> Self {
        Self::new(op, collection, msg.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    #[error("chunk max_size must be greater than zero")]
    ZeroMaxSize,

    #[error("chunk overlap {overlap} must be smaller than max_size {max_size}")]
    OverlapTooLarge { max_size: usize, overlap: usize },
}
