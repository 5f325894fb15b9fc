//! In-process `VectorStore` with brute-force scoring.
//!
//! Used by tests and by `store.backend = "memory"` for throwaway runs; nothing
//! is persisted.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, info};

use codevec_core::types::{Chunk, CollectionConfig, Distance, ScoredPoint};
use codevec_core::{StoreError, StoreOp, VectorStore};

#[derive(Debug)]
struct MemoryCollection {
    dim: usize,
    distance: Distance,
    config: CollectionConfig,
    points: BTreeMap<String, Chunk>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Number of stored points, `None` if the collection does not exist.
    pub fn point_count(&self, name: &str) -> Option<usize> {
        let guard = self.collections.read().ok()?;
        guard.get(name).map(|c| c.points.len())
    }

    /// Dimensionality, metric and layout of a collection.
    pub fn describe(&self, name: &str) -> Option<(usize, Distance, CollectionConfig)> {
        let guard = self.collections.read().ok()?;
        guard.get(name).map(|c| (c.dim, c.distance, c.config))
    }

    /// All points of a collection ordered by id.
    pub fn points(&self, name: &str) -> Vec<Chunk> {
        match self.collections.read() {
            Ok(guard) => guard.get(name).map(|c| c.points.values().cloned().collect()).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }
}

fn poisoned(op: StoreOp, name: &str) -> StoreError { StoreError::invalid(op, name, "memory store lock poisoned") }

fn missing(op: StoreOp, name: &str) -> StoreError { StoreError::invalid(op, name, "collection does not exist") }

pub fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        Distance::Dot => dot,
        Distance::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
        }
        Distance::Euclid => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let guard = self.collections.read().map_err(|_| poisoned(StoreOp::CollectionExists, name))?;
        Ok(guard.contains_key(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimensionality: usize,
        distance: Distance,
        config: CollectionConfig,
    ) -> Result<(), StoreError> {
        let op = StoreOp::CreateCollection;
        if dimensionality == 0 {
            return Err(StoreError::invalid(op, name, "dimensionality must be greater than zero"));
        }
        let mut guard = self.collections.write().map_err(|_| poisoned(op, name))?;
        if let Some(existing) = guard.get(name) {
            if existing.dim != dimensionality {
                return Err(StoreError::invalid(
                    op,
                    name,
                    format!("collection exists with dimensionality {}, requested {}", existing.dim, dimensionality),
                ));
            }
            return Ok(());
        }
        guard.insert(name.to_string(), MemoryCollection { dim: dimensionality, distance, config, points: BTreeMap::new() });
        info!(collection = name, dim = dimensionality, %distance, "collection created");
        Ok(())
    }

    async fn upsert(&self, name: &str, points: Vec<Chunk>, wait: bool) -> Result<(), StoreError> {
        let op = StoreOp::Upsert;
        let mut guard = self.collections.write().map_err(|_| poisoned(op, name))?;
        let collection = guard.get_mut(name).ok_or_else(|| missing(op, name))?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != collection.dim) {
            return Err(StoreError::invalid(
                op,
                name,
                format!("point {} has {} dimensions, collection expects {}", bad.id, bad.vector.len(), collection.dim),
            ));
        }
        let n = points.len();
        for p in points { collection.points.insert(p.id.clone(), p); }
        debug!(collection = name, points = n, wait, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        query: &[f32],
        limit: usize,
        with_payload: bool,
        with_vector: bool,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let op = StoreOp::Search;
        let guard = self.collections.read().map_err(|_| poisoned(op, name))?;
        let collection = guard.get(name).ok_or_else(|| missing(op, name))?;
        if query.len() != collection.dim {
            return Err(StoreError::invalid(
                op,
                name,
                format!("query has {} dimensions, collection expects {}", query.len(), collection.dim),
            ));
        }
        let distance = collection.distance;
        let mut scored: Vec<(f32, &Chunk)> = collection.points.values().map(|p| (score(distance, query, &p.vector), p)).collect();
        if distance.higher_is_better() {
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        } else {
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(s, p)| ScoredPoint {
                id: p.id.clone(),
                score: s,
                payload: with_payload.then(|| p.payload.clone()),
                vector: with_vector.then(|| p.vector.clone()),
            })
            .collect())
    }
}
