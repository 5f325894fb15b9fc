use futures::{stream, StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use codevec_core::source::{list_source_files, SourceFile};
use codevec_core::types::{Chunk, ChunkPayload, DirectoryReport, ExtraMetadata, IndexReport, SourceFileMetadata};
use codevec_core::{Chunker, Embedder, EmbeddingError, Error, Result, VectorStore};

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Sole writer of chunks: chunk, embed, and upsert one file at a time.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    chunker: Chunker,
    max_concurrency: usize,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self { embedder, store, collection: collection.into(), chunker: Chunker::default(), max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Upper bound on embedding calls in flight for a single file.
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn collection(&self) -> &str { &self.collection }

    pub async fn index_file(&self, path: &str, raw_text: &str) -> Result<IndexReport> {
        self.index_file_with_extra(path, raw_text, ExtraMetadata::new()).await
    }

    /// Index one file. Nothing is written unless every chunk embeds successfully.
    pub async fn index_file_with_extra(&self, path: &str, raw_text: &str, extra: ExtraMetadata) -> Result<IndexReport> {
        let source = SourceFileMetadata::from_relative_path(path);
        let pieces = self.chunker.split(raw_text);
        let total_chunks = pieces.len();
        if total_chunks == 0 {
            debug!(file = path, "empty file, nothing to index");
            return Ok(IndexReport { path: source.filename, chunks_written: 0, ids: Vec::new() });
        }

        // `buffered` keeps results in input order, so index i stays paired with piece i.
        let embedder = self.embedder.as_ref();
        let vectors: Vec<Vec<f32>> = stream::iter(pieces.iter().map(|text| embedder.embed(text)))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;
        let dim = embedder.dim();
        if let Some(v) = vectors.iter().find(|v| v.len() != dim) {
            return Err(EmbeddingError::DimensionMismatch { expected: dim, got: v.len() }.into());
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(chunk_index, (text, vector))| Chunk {
                id: Uuid::new_v4().to_string(),
                vector,
                payload: ChunkPayload { text, chunk_index, total_chunks, source: source.clone(), extra: extra.clone() },
            })
            .collect();
        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();

        self.store.upsert(&self.collection, chunks, true).await?;
        info!(file = %source.filename, chunks = total_chunks, collection = %self.collection, "Stored {} code chunks", total_chunks);
        Ok(IndexReport { path: source.filename, chunks_written: total_chunks, ids })
    }

    /// Index files in order, stopping at the first failure. Files already
    /// written stay indexed. `on_file` is called after each stored file.
    pub async fn index_sources(&self, files: &[SourceFile], mut on_file: impl FnMut(&IndexReport)) -> Result<DirectoryReport> {
        let mut report = DirectoryReport::default();
        for file in files {
            let wrap = |e: Error| Error::IndexFile { path: file.relative_path.clone(), source: Box::new(e) };
            let content = file.read().map_err(wrap)?;
            let file_report = self.index_file(&file.relative_path, &content).await.map_err(wrap)?;
            report.files_indexed += 1;
            report.chunks_written += file_report.chunks_written;
            on_file(&file_report);
        }
        Ok(report)
    }

    /// Walk `root` for files with an allowed extension and index each one.
    /// Fails if `root` does not exist.
    pub async fn index_directory(&self, root: &Path, extensions: &[String]) -> Result<DirectoryReport> {
        let files = list_source_files(root, extensions)?;
        info!(root = %root.display(), files = files.len(), "Found {} code files to process", files.len());
        self.index_sources(&files, |_| {}).await
    }
}
