//! `VectorStore` backed by LanceDB.
//!
//! A collection is a Lance table of chunk rows with a fixed-size vector
//! column; its distance metric and layout hints live in the `meta` table.

use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType};
use std::sync::Arc;
use tracing::{debug, info};

use codevec_core::error::BoxError;
use codevec_core::types::{Chunk, ChunkPayload, CollectionConfig, Distance, ExtraMetadata, ScoredPoint, SourceFileMetadata};
use codevec_core::{StoreError, StoreOp, VectorStore};

use crate::schema::{build_chunk_schema, vector_dim, PAYLOAD_COLUMNS, VECTOR_COLUMN};
use crate::table::{ensure_table, get_meta, open_db, set_meta, table_exists, META_TABLE};

pub struct LanceStore { conn: Connection }

impl LanceStore {
    pub async fn open(uri: &str) -> Result<Self, BoxError> {
        let conn = open_db(uri).await?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self { Self { conn } }

    /// Metric recorded when the collection was created.
    pub async fn distance_for(&self, name: &str) -> Result<Distance, BoxError> {
        match get_meta(&self.conn, META_TABLE, &meta_key(name, "distance")).await? {
            Some(v) => Ok(v.parse::<Distance>()?),
            None => Err(format!("no distance metric recorded for collection '{name}'").into()),
        }
    }

    pub async fn count(&self, name: &str) -> Result<usize, BoxError> {
        let table = self.conn.open_table(name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    async fn do_create(&self, name: &str, dim: usize, distance: Distance, config: CollectionConfig) -> Result<(), BoxError> {
        if name == META_TABLE {
            return Err(format!("'{META_TABLE}' is reserved").into());
        }
        let dim_i32 = i32::try_from(dim)?;
        if table_exists(&self.conn, name).await? {
            let existing = self.table_dim(name).await?;
            if existing != dim {
                return Err(format!("collection exists with dimensionality {existing}, requested {dim}").into());
            }
            return Ok(());
        }
        // Metadata first: a table never exists without its metric.
        set_meta(&self.conn, META_TABLE, &meta_key(name, "distance"), distance.as_str()).await?;
        set_meta(&self.conn, META_TABLE, &meta_key(name, "segments"), &config.default_segment_number.to_string()).await?;
        set_meta(&self.conn, META_TABLE, &meta_key(name, "replication"), &config.replication_factor.to_string()).await?;
        ensure_table(&self.conn, name, build_chunk_schema(dim_i32)).await?;
        info!(collection = name, dim, %distance, "collection created");
        Ok(())
    }

    async fn table_dim(&self, name: &str) -> Result<usize, BoxError> {
        let table = self.conn.open_table(name).execute().await?;
        let schema = table.schema().await?;
        Ok(vector_dim(&schema).ok_or("table has no fixed-size vector column")?)
    }

    async fn do_upsert(&self, name: &str, points: &[Chunk]) -> Result<(), BoxError> {
        let dim = self.table_dim(name).await?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != dim) {
            return Err(format!("point {} has {} dimensions, collection expects {}", bad.id, bad.vector.len(), dim).into());
        }
        let schema = build_chunk_schema(i32::try_from(dim)?);
        let batch = chunks_to_record_batch(points, dim)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.conn.open_table(name).execute().await?;
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await?;
        Ok(())
    }

    async fn do_search(
        &self,
        name: &str,
        query: &[f32],
        limit: usize,
        with_payload: bool,
        with_vector: bool,
    ) -> Result<Vec<ScoredPoint>, BoxError> {
        let dim = self.table_dim(name).await?;
        if query.len() != dim {
            return Err(format!("query has {} dimensions, collection expects {}", query.len(), dim).into());
        }
        let table = self.conn.open_table(name).execute().await?;
        if limit == 0 || table.count_rows(None).await? == 0 {
            return Ok(Vec::new());
        }
        let distance = self.distance_for(name).await?;
        let mut columns: Vec<&str> = if with_payload { PAYLOAD_COLUMNS.to_vec() } else { vec!["id"] };
        if with_vector { columns.push(VECTOR_COLUMN); }
        let mut stream = table
            .vector_search(query.to_vec())?
            .distance_type(lance_distance(distance))
            .select(Select::columns(columns.as_slice()))
            .limit(limit)
            .execute()
            .await?;
        let mut hits: Vec<(f32, ScoredPoint)> = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_col(&batch, "id")?;
            let dists = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or("search result has no _distance column")?;
            for i in 0..batch.num_rows() {
                let raw = dists.value(i);
                let payload = if with_payload { Some(payload_at(&batch, i)?) } else { None };
                let vector = if with_vector { Some(vector_at(&batch, i)?) } else { None };
                hits.push((raw, ScoredPoint { id: ids.value(i).to_string(), score: score_from_distance(distance, raw), payload, vector }));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits.into_iter().take(limit).map(|(_, p)| p).collect())
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        if name == META_TABLE { return Ok(false); }
        table_exists(&self.conn, name).await.map_err(|e| StoreError::new(StoreOp::CollectionExists, name, e))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimensionality: usize,
        distance: Distance,
        config: CollectionConfig,
    ) -> Result<(), StoreError> {
        self.do_create(name, dimensionality, distance, config)
            .await
            .map_err(|e| StoreError::new(StoreOp::CreateCollection, name, e))
    }

    async fn upsert(&self, name: &str, points: Vec<Chunk>, wait: bool) -> Result<(), StoreError> {
        if points.is_empty() { return Ok(()); }
        // Lance commits the new table version before merge_insert returns, so `wait` is always honoured.
        self.do_upsert(name, &points).await.map_err(|e| StoreError::new(StoreOp::Upsert, name, e))?;
        debug!(collection = name, points = points.len(), wait, "upserted points");
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
        let hits = self
            .do_search(name, query, limit, with_payload, with_vector)
            .await
            .map_err(|e| StoreError::new(StoreOp::Search, name, e))?;
        debug!(collection = name, limit, hits = hits.len(), "vector search");
        Ok(hits)
    }
}

fn meta_key(collection: &str, field: &str) -> String { format!("collection:{collection}:{field}") }

fn lance_distance(d: Distance) -> DistanceType {
    match d {
        Distance::Cosine => DistanceType::Cosine,
        Distance::Euclid => DistanceType::L2,
        Distance::Dot => DistanceType::Dot,
    }
}

/// Lance reports distances (lower is closer). Cosine and dot become similarities.
fn score_from_distance(d: Distance, raw: f32) -> f32 {
    match d {
        Distance::Cosine | Distance::Dot => 1.0 - raw,
        Distance::Euclid => raw,
    }
}

fn chunks_to_record_batch(points: &[Chunk], dim: usize) -> Result<RecordBatch, BoxError> {
    let schema = build_chunk_schema(i32::try_from(dim)?);
    let mut ids = Vec::new(); let mut texts = Vec::new(); let mut chunk_indices = Vec::new(); let mut total_chunks = Vec::new();
    let mut languages = Vec::new(); let mut filenames = Vec::new(); let mut file_paths = Vec::new(); let mut extras = Vec::new();
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
    for p in points {
        ids.push(p.id.clone());
        texts.push(p.payload.text.clone());
        chunk_indices.push(i32::try_from(p.payload.chunk_index)?);
        total_chunks.push(i32::try_from(p.payload.total_chunks)?);
        languages.push(p.payload.source.language.clone());
        filenames.push(p.payload.source.filename.clone());
        file_paths.push(p.payload.source.file_path.clone());
        extras.push(serde_json::to_string(&p.payload.extra)?);
        vectors.push(Some(p.vector.iter().map(|&x| Some(x)).collect()));
    }
    let record_batch = RecordBatch::try_new(schema, vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(texts)),
        Arc::new(Int32Array::from(chunk_indices)),
        Arc::new(Int32Array::from(total_chunks)),
        Arc::new(StringArray::from(languages)),
        Arc::new(StringArray::from(filenames)),
        Arc::new(StringArray::from(file_paths)),
        Arc::new(StringArray::from(extras)),
        Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), i32::try_from(dim)?)),
    ])?;
    Ok(record_batch)
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, BoxError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| format!("missing {name} column").into())
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array, BoxError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| format!("missing {name} column").into())
}

fn payload_at(batch: &RecordBatch, i: usize) -> Result<ChunkPayload, BoxError> {
    let extra: ExtraMetadata = serde_json::from_str(string_col(batch, "extra")?.value(i))?;
    Ok(ChunkPayload {
        text: string_col(batch, "text")?.value(i).to_string(),
        chunk_index: usize::try_from(int_col(batch, "chunk_index")?.value(i))?,
        total_chunks: usize::try_from(int_col(batch, "total_chunks")?.value(i))?,
        source: SourceFileMetadata {
            language: string_col(batch, "language")?.value(i).to_string(),
            filename: string_col(batch, "filename")?.value(i).to_string(),
            file_path: string_col(batch, "file_path")?.value(i).to_string(),
        },
        extra,
    })
}

fn vector_at(batch: &RecordBatch, i: usize) -> Result<Vec<f32>, BoxError> {
    let col = batch
        .column_by_name(VECTOR_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or("missing vector column")?;
    if !col.is_valid(i) { return Err("null vector".into()); }
    Ok(col.value(i).as_primitive::<arrow_array::types::Float32Type>().values().to_vec())
}
