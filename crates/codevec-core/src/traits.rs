use async_trait::async_trait;

use crate::error::{EmbeddingError, StoreError};
use crate::types::{Chunk, CollectionConfig, Distance, ScoredPoint};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `openai:text-embedding-ada-002:d1536`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Embed one text. Implementations must return exactly `dim()` floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_collection(
        &self,
        name: &str,
        dimensionality: usize,
        distance: Distance,
        config: CollectionConfig,
    ) -> Result<(), StoreError>;

    /// Insert or replace points by id. With `wait` the call returns once the
    /// write is visible to `search`.
    async fn upsert(&self, name: &str, points: Vec<Chunk>, wait: bool) -> Result<(), StoreError>;

    /// Nearest neighbours of `query`, best first, at most `limit` entries.
    async fn search(
        &self,
        name: &str,
        query: &[f32],
        limit: usize,
        with_payload: bool,
        with_vector: bool,
    ) -> Result<Vec<ScoredPoint>, StoreError>;
}
