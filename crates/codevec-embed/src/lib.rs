//! Embedding providers behind the `codevec_core::Embedder` trait.
//!
//! `OpenAiEmbedder` calls a remote `/embeddings` endpoint; `FakeEmbedder` is a
//! deterministic hashing embedder for tests and offline runs. Set
//! `APP_USE_FAKE_EMBEDDINGS=1` (or `embedding.provider = "fake"`) to select it.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use codevec_core::config::EmbeddingSettings;
use codevec_core::Embedder;
use tracing::info;

pub mod fake;
pub mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() || settings.provider.eq_ignore_ascii_case("fake") {
        info!(dim = settings.dimension, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    match settings.provider.to_ascii_lowercase().as_str() {
        "openai" => {
            let embedder = OpenAiEmbedder::new(settings)?;
            info!(id = embedder.embedder_id(), "using remote embedder");
            Ok(Arc::new(embedder))
        }
        other => Err(anyhow!("Unknown embedding provider '{}'", other)),
    }
}
