use tracing::{debug, info};

use codevec_core::types::{CollectionConfig, Distance};
use codevec_core::{Result, VectorStore};

/// Create `name` with the given dimensionality and metric unless it exists.
/// Returns `true` when this call created the collection.
///
/// Two processes starting against a fresh store can both observe "absent" and
/// both attempt creation; the loser surfaces the store's error.
pub async fn ensure_collection(store: &dyn VectorStore, name: &str, dimensionality: usize, distance: Distance) -> Result<bool> {
    if store.collection_exists(name).await? {
        debug!(collection = name, "collection already present");
        return Ok(false);
    }
    store.create_collection(name, dimensionality, distance, CollectionConfig::default()).await?;
    info!(collection = name, dimensionality, %distance, "Collection {} created successfully", name);
    Ok(true)
}
