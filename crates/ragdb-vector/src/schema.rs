use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const VECTOR_COLUMN: &str = "vector";

/// One row per chunk. Header and language columns are null when absent.
pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, false),
		Field::new("file_type", DataType::Utf8, false),
		Field::new("language", DataType::Utf8, true),
		Field::new("header1", DataType::Utf8, true),
		Field::new("header2", DataType::Utf8, true),
		Field::new("header3", DataType::Utf8, true),
		Field::new("header4", DataType::Utf8, true),
		Field::new("content", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("total_chunks", DataType::Int32, false),
		Field::new("start", DataType::Int32, false),
		Field::new("overlap", DataType::Int32, false),
		Field::new("content_hash", DataType::Utf8, false),
		Field::new("ingested_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Vector width declared by an existing table schema, if it has a vector column.
pub fn vector_dim(schema: &Schema) -> Option<i32> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, dim) => Some(*dim),
		_ => None,
	}
}
