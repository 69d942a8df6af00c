use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const COL_ID: &str = "id";
pub const COL_TEXT: &str = "text";
pub const COL_SOURCE: &str = "source";
pub const COL_STATUS: &str = "status";
pub const COL_DOC_TYPE: &str = "doc_type";
pub const COL_METADATA: &str = "metadata";
pub const COL_VECTOR: &str = "vector";
pub const COL_DISTANCE: &str = "_distance";

/// Metadata keys mirrored into their own column, so equality filters on them can
/// be pushed down into the lance scan.
pub const FILTER_COLUMNS: [&str; 3] = [COL_SOURCE, COL_STATUS, COL_DOC_TYPE];

pub fn build_chunks_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(COL_ID, DataType::Utf8, false),
		Field::new(COL_TEXT, DataType::Utf8, false),
		Field::new(COL_SOURCE, DataType::Utf8, true),
		Field::new(COL_STATUS, DataType::Utf8, true),
		Field::new(COL_DOC_TYPE, DataType::Utf8, true),
		// full flattened metadata map as a JSON object
		Field::new(COL_METADATA, DataType::Utf8, false),
		Field::new(COL_VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
