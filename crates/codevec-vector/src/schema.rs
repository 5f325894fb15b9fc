use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";

/// Payload columns, in schema order. `extra` holds the extension map as JSON.
pub const PAYLOAD_COLUMNS: [&str; 8] = ["id", "text", "chunk_index", "total_chunks", "language", "filename", "file_path", "extra"];

pub fn vector_field(dim: i32) -> Field {
	Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true)
}

pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("total_chunks", DataType::Int32, false),
		Field::new("language", DataType::Utf8, false),
		Field::new("filename", DataType::Utf8, false),
		Field::new("file_path", DataType::Utf8, false),
		Field::new("extra", DataType::Utf8, false),
		vector_field(dim),
	]))
}

/// Dimensionality of a chunk table, read back from its vector column.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}

pub fn build_meta_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("key", DataType::Utf8, false),
		Field::new("value", DataType::Utf8, false),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}
