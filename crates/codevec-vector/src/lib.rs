//! codevec-vector
//!
//! Vector store backends: `LanceStore` (LanceDB tables on local disk or object
//! storage) and `MemoryStore` (in-process, for tests and throwaway runs).

use std::sync::Arc;

use codevec_core::config::StoreSettings;
use codevec_core::error::BoxError;
use codevec_core::VectorStore;

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceStore;
pub use memory::MemoryStore;

/// Open the backend named by `settings.backend` at `uri`.
pub async fn open_store(settings: &StoreSettings, uri: &str) -> Result<Arc<dyn VectorStore>, BoxError> {
    match settings.backend.to_ascii_lowercase().as_str() {
        "lance" | "lancedb" => Ok(Arc::new(LanceStore::open(uri).await?)),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(format!("unknown store backend '{other}'").into()),
    }
}
