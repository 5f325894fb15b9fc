use codevec_core::types::{Chunk, ChunkPayload, CollectionConfig, Distance, ExtraMetadata, SourceFileMetadata};
use codevec_core::{StoreOp, VectorStore};
use codevec_embed::FakeEmbedder;
use codevec_vector::schema::build_chunk_schema;
use codevec_vector::table::{ensure_table, get_meta, open_db, META_TABLE};
use codevec_vector::LanceStore;

const DIM: usize = 16;

fn chunk(embedder: &FakeEmbedder, id: &str, path: &str, text: &str, index: usize, total: usize) -> Chunk {
    Chunk {
        id: id.to_string(),
        vector: embedder.embed_sync(text),
        payload: ChunkPayload {
            text: text.to_string(),
            chunk_index: index,
            total_chunks: total,
            source: SourceFileMetadata::from_relative_path(path),
            extra: ExtraMetadata::new(),
        },
    }
}

async fn open_tmp() -> anyhow::Result<(tempfile::TempDir, LanceStore)> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceStore::open(&uri).await.map_err(|e| anyhow::anyhow!(e))?;
    Ok((tmp, store))
}

#[tokio::test]
async fn create_is_idempotent_and_records_distance() -> anyhow::Result<()> {
    let (tmp, store) = open_tmp().await?;
    assert!(!store.collection_exists("code").await?);
    store.create_collection("code", DIM, Distance::Dot, CollectionConfig::default()).await?;
    assert!(store.collection_exists("code").await?);
    store.create_collection("code", DIM, Distance::Dot, CollectionConfig::default()).await?;

    let distance = store.distance_for("code").await.map_err(|e| anyhow::anyhow!(e))?;
    assert_eq!(distance, Distance::Dot);
    let conn = open_db(&tmp.path().to_string_lossy()).await.map_err(|e| anyhow::anyhow!(e))?;
    let segments = get_meta(&conn, META_TABLE, "collection:code:segments").await.map_err(|e| anyhow::anyhow!(e))?;
    assert_eq!(segments.as_deref(), Some("2"));
    Ok(())
}

#[tokio::test]
async fn create_with_other_dimensionality_fails() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    store.create_collection("code", DIM, Distance::Cosine, CollectionConfig::default()).await?;
    let err = store.create_collection("code", DIM * 2, Distance::Cosine, CollectionConfig::default()).await.unwrap_err();
    assert_eq!(err.op, StoreOp::CreateCollection);
    assert_eq!(err.collection, "code");
    Ok(())
}

#[tokio::test]
async fn search_on_empty_table_returns_nothing() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    store.create_collection("code", DIM, Distance::Cosine, CollectionConfig::default()).await?;
    let hits = store.search("code", &vec![0.5; DIM], 5, true, false).await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn upsert_then_search_returns_payload() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    let embedder = FakeEmbedder::new(DIM);
    store.create_collection("code", DIM, Distance::Cosine, CollectionConfig::default()).await?;

    let mut extra = ExtraMetadata::new();
    extra.insert("repo", "homestead")?;
    let mut first = chunk(&embedder, "c-1", "src/tasks.ts", "export enum TaskCategory { Work, Home }", 0, 2);
    first.payload.extra = extra.clone();
    let points = vec![
        first,
        chunk(&embedder, "c-2", "src/tasks.ts", "export const categories = Object.values(TaskCategory);", 1, 2),
        chunk(&embedder, "c-3", "src/view.jsx", "return <ul>{items}</ul>;", 0, 1),
    ];
    store.upsert("code", points.clone(), true).await?;
    assert_eq!(store.count("code").await.map_err(|e| anyhow::anyhow!(e))?, 3);

    let query = embedder.embed_sync("export enum TaskCategory { Work, Home }");
    let hits = store.search("code", &query, 2, true, true).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "c-1");
    assert!((hits[0].score - 1.0).abs() < 1e-3, "score {}", hits[0].score);
    assert!(hits[0].score >= hits[1].score);
    assert_eq!(hits[0].payload.as_ref(), Some(&points[0].payload));
    assert_eq!(hits[0].vector.as_ref().map(Vec::len), Some(DIM));

    let bare = store.search("code", &query, 1, false, false).await?;
    assert!(bare[0].payload.is_none());
    assert!(bare[0].vector.is_none());
    Ok(())
}

#[tokio::test]
async fn upsert_replaces_by_id() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    let embedder = FakeEmbedder::new(DIM);
    store.create_collection("code", DIM, Distance::Cosine, CollectionConfig::default()).await?;
    store.upsert("code", vec![chunk(&embedder, "same", "a.ts", "let a = 1;", 0, 1)], true).await?;
    store.upsert("code", vec![chunk(&embedder, "same", "a.ts", "let a = 2;", 0, 1)], true).await?;
    assert_eq!(store.count("code").await.map_err(|e| anyhow::anyhow!(e))?, 1);

    let hits = store.search("code", &embedder.embed_sync("let a = 2;"), 5, true, false).await?;
    assert_eq!(hits[0].payload.as_ref().map(|p| p.text.as_str()), Some("let a = 2;"));
    Ok(())
}

#[tokio::test]
async fn wrong_dimensions_are_rejected() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    let embedder = FakeEmbedder::new(DIM + 1);
    store.create_collection("code", DIM, Distance::Cosine, CollectionConfig::default()).await?;
    let err = store.upsert("code", vec![chunk(&embedder, "x", "a.ts", "let a = 1;", 0, 1)], true).await.unwrap_err();
    assert_eq!(err.op, StoreOp::Upsert);
    let err = store.search("code", &vec![0.1; DIM + 1], 3, true, false).await.unwrap_err();
    assert_eq!(err.op, StoreOp::Search);
    Ok(())
}

#[tokio::test]
async fn euclid_scores_rank_ascending() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    let embedder = FakeEmbedder::new(DIM);
    store.create_collection("code", DIM, Distance::Euclid, CollectionConfig::default()).await?;
    store
        .upsert(
            "code",
            vec![
                chunk(&embedder, "near", "a.ts", "const total = sum(values);", 0, 1),
                chunk(&embedder, "far", "b.ts", "render(<App />, root);", 0, 1),
            ],
            true,
        )
        .await?;
    let hits = store.search("code", &embedder.embed_sync("const total = sum(values);"), 2, true, false).await?;
    assert_eq!(hits[0].id, "near");
    assert!(hits[0].score <= hits[1].score);
    assert!(hits[0].score.abs() < 1e-3);
    Ok(())
}

#[tokio::test]
async fn bookkeeping_table_is_not_a_collection() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp().await?;
    store.create_collection("code", DIM, Distance::Euclid, CollectionConfig::default()).await?;
    assert!(!store.collection_exists(META_TABLE).await?);
    let err = store.create_collection(META_TABLE, DIM, Distance::Cosine, CollectionConfig::default()).await.unwrap_err();
    assert_eq!(err.op, StoreOp::CreateCollection);

    // a user collection called "meta" is an ordinary collection
    assert!(!store.collection_exists("meta").await?);
    store.create_collection("meta", DIM, Distance::Dot, CollectionConfig::default()).await?;
    assert!(store.collection_exists("meta").await?);
    assert_eq!(store.distance_for("meta").await.map_err(|e| anyhow::anyhow!(e))?, Distance::Dot);
    assert_eq!(store.distance_for("code").await.map_err(|e| anyhow::anyhow!(e))?, Distance::Euclid);
    Ok(())
}

#[tokio::test]
async fn table_without_recorded_metric_is_an_error() -> anyhow::Result<()> {
    let (tmp, store) = open_tmp().await?;
    let conn = open_db(&tmp.path().to_string_lossy()).await.map_err(|e| anyhow::anyhow!(e))?;
    ensure_table(&conn, "orphan", build_chunk_schema(DIM as i32)).await.map_err(|e| anyhow::anyhow!(e))?;
    assert!(store.distance_for("orphan").await.is_err());
    Ok(())
}
