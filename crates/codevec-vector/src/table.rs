//! LanceDB connection and housekeeping helpers.
//!
//! Provides the database open function, an ensure-table helper, and a simple
//! key/value metadata table that records per-collection settings (distance
//! metric, segment and replication hints) LanceDB itself does not keep.

use lancedb::{connect, Connection};

use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::Schema;
use chrono::Utc;
use codevec_core::error::BoxError;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

use crate::schema::build_meta_schema;

/// Bookkeeping table. Not usable as a collection name.
pub const META_TABLE: &str = "_codevec_meta";

pub async fn open_db(uri: &str) -> Result<Connection, BoxError> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool, BoxError> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

/// Create an empty table with `schema` unless one named `name` exists.
/// Returns whether the table was created.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<bool, BoxError> {
    if table_exists(conn, name).await? {
        return Ok(false);
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(true)
}

pub async fn ensure_meta_table(conn: &Connection, name: &str) -> Result<(), BoxError> {
    ensure_table(conn, name, build_meta_schema()).await.map(|_| ())
}

pub async fn set_meta(conn: &Connection, table: &str, key: &str, value: &str) -> Result<(), BoxError> {
    ensure_meta_table(conn, table).await?;
    let t = conn.open_table(table).execute().await?;
    let rb = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(vec![key.to_string()])),
            Arc::new(StringArray::from(vec![value.to_string()])),
            Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
    // key is unique
    let mut mi = t.merge_insert(&["key"]);
    mi.when_matched_update_all(None).when_not_matched_insert_all();
    mi.execute(reader).await?;
    Ok(())
}

pub async fn get_meta(conn: &Connection, table: &str, key: &str) -> Result<Option<String>, BoxError> {
    if !table_exists(conn, table).await? { return Ok(None); }
    let t = conn.open_table(table).execute().await?;
    let mut stream = t.query().only_if(format!("key = '{}'", key.replace('\'', "''"))).execute().await?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        if batch.num_rows() == 0 { continue; }
        let val = batch
            .column_by_name("value")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or("meta.value column missing")?;
        return Ok(Some(val.value(0).to_string()));
    }
    Ok(None)
}
