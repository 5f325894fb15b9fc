//! Domain types shared by the chunking, embedding, storage and search stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

pub type ChunkId = String;

/// Payload keys owned by the pipeline. Extra metadata may not reuse them.
pub const RESERVED_KEYS: [&str; 6] = ["text", "chunkIndex", "totalChunks", "language", "filename", "filePath"];

/// Scalar value stored in the extension metadata map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self { MetaValue::Text(v.to_string()) }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self { MetaValue::Text(v) }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self { MetaValue::Int(v) }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self { MetaValue::Float(v) }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self { MetaValue::Bool(v) }
}

/// Caller-supplied metadata attached to every chunk of a file.
///
/// Keys are kept sorted so payloads serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraMetadata(BTreeMap<String, MetaValue>);

impl ExtraMetadata {
    pub fn new() -> Self { Self::default() }

    /// Insert a key, rejecting names that collide with fixed payload fields.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Result<()> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(Error::InvalidMetadata(format!("'{key}' is a reserved payload key")));
        }
        self.0.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> { self.0.get(key) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }
}

/// Per-file metadata derived from the path at index time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileMetadata {
    pub language: String,
    pub filename: String,
    /// Same value as `filename`; kept so payloads match the established layout.
    pub file_path: String,
}

impl SourceFileMetadata {
    pub fn from_relative_path(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        Self { language: language_from_path(&normalized).to_string(), filename: normalized.clone(), file_path: normalized }
    }
}

/// Map a file extension to the language label stored with each chunk.
pub fn language_from_path(path: &str) -> &'static str {
    let ext = Path::new(path).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("ts" | "tsx") => "typescript",
        Some("js" | "jsx") => "javascript",
        _ => "unknown",
    }
}

/// Everything stored next to a vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    pub text: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    #[serde(flatten)]
    pub source: SourceFileMetadata,
    #[serde(flatten)]
    pub extra: ExtraMetadata,
}

/// A chunk of a source file ready to be upserted.
///
/// - `id`: globally unique chunk identifier
/// - `vector`: embedding with exactly the collection's dimensionality
/// - `payload`: text, position within the file and file metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A single hit as returned by a vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: ChunkId,
    pub score: f32,
    pub payload: Option<ChunkPayload>,
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub chunk_index: usize,
    pub total_chunks: usize,
    #[serde(flatten)]
    pub source: SourceFileMetadata,
    #[serde(flatten)]
    pub extra: ExtraMetadata,
}

/// A ranked chunk returned to callers of the searcher.
///
/// `score` follows the collection's distance metric; see [`Distance::higher_is_better`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f32,
    pub metadata: ResultMetadata,
}

impl From<(ChunkPayload, f32)> for SearchResult {
    fn from((payload, score): (ChunkPayload, f32)) -> Self {
        Self {
            text: payload.text,
            score,
            metadata: ResultMetadata {
                chunk_index: payload.chunk_index,
                total_chunks: payload.total_chunks,
                source: payload.source,
                extra: payload.extra,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
}

impl Distance {
    pub fn as_str(self) -> &'static str {
        match self {
            Distance::Cosine => "cosine",
            Distance::Euclid => "euclid",
            Distance::Dot => "dot",
        }
    }

    /// Cosine and dot scores are similarities; euclid scores are distances.
    pub fn higher_is_better(self) -> bool { !matches!(self, Distance::Euclid) }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "euclid" | "l2" | "euclidean" => Ok(Distance::Euclid),
            "dot" => Ok(Distance::Dot),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

/// Storage layout hints applied when a collection is first created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub default_segment_number: u32,
    pub replication_factor: u32,
}

impl Default for CollectionConfig {
    fn default() -> Self { Self { default_segment_number: 2, replication_factor: 1 } }
}

/// Outcome of indexing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub path: String,
    pub chunks_written: usize,
    pub ids: Vec<ChunkId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub files_indexed: usize,
    pub chunks_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_mapping_follows_extension() {
        assert_eq!(language_from_path("x.jsx"), "javascript");
        assert_eq!(language_from_path("src/App.TSX"), "typescript");
        assert_eq!(language_from_path("x.py"), "unknown");
        assert_eq!(language_from_path("Makefile"), "unknown");
    }

    #[test]
    fn reserved_keys_are_rejected() {
        let mut extra = ExtraMetadata::new();
        assert!(extra.insert("author", "jo").is_ok());
        assert!(matches!(extra.insert("chunkIndex", 3i64), Err(Error::InvalidMetadata(_))));
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn payload_serializes_flat_camel_case() {
        let mut extra = ExtraMetadata::new();
        extra.insert("author", "jo").expect("insert");
        let payload = ChunkPayload {
            text: "let a = 1;".into(),
            chunk_index: 0,
            total_chunks: 1,
            source: SourceFileMetadata::from_relative_path("src/a.js"),
            extra,
        };
        let v = serde_json::to_value(&payload).expect("json");
        assert_eq!(v["chunkIndex"], 0);
        assert_eq!(v["filePath"], "src/a.js");
        assert_eq!(v["language"], "javascript");
        assert_eq!(v["author"], "jo");
        let back: ChunkPayload = serde_json::from_value(v).expect("back");
        assert_eq!(back, payload);
    }

    #[test]
    fn distance_parses_aliases() {
        assert_eq!("L2".parse::<Distance>(), Ok(Distance::Euclid));
        assert_eq!("cosine".parse::<Distance>(), Ok(Distance::Cosine));
        assert!("manhattan".parse::<Distance>().is_err());
    }
}
