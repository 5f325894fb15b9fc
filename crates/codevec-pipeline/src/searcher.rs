use std::sync::Arc;
use tracing::debug;

use codevec_core::types::SearchResult;
use codevec_core::{Embedder, EmbeddingError, Result, StoreError, StoreOp, VectorStore};

pub const DEFAULT_LIMIT: usize = 5;

pub struct Searcher {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl Searcher {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self { embedder, store, collection: collection.into() }
    }

    /// Top `limit` chunks for `query` in the store's ranking order.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let vector = self.embedder.embed(query).await?;
        let dim = self.embedder.dim();
        if vector.len() != dim {
            return Err(EmbeddingError::DimensionMismatch { expected: dim, got: vector.len() }.into());
        }
        let hits = self.store.search(&self.collection, &vector, limit, true, false).await?;
        debug!(collection = %self.collection, limit, hits = hits.len(), "search");
        hits.into_iter()
            .map(|hit| -> Result<SearchResult> {
                let payload = hit.payload.ok_or_else(|| {
                    StoreError::invalid(StoreOp::Search, &self.collection, format!("point {} returned without payload", hit.id))
                })?;
                Ok(SearchResult::from((payload, hit.score)))
            })
            .collect()
    }

    pub async fn search_default(&self, query: &str) -> Result<Vec<SearchResult>> { self.search(query, DEFAULT_LIMIT).await }
}
