//! Field naming used by the database-preservation index
//!
//! Every row of every table is one document. Metadata fields carry the
//! `dbpres_meta_` prefix and cell values carry `dbpres_data_<N>` where N is
//! the 1-based column position.

pub const DATA_PREFIX: &str = "dbpres_data_";

pub const META_ID: &str = "dbpres_meta_id";
pub const META_TABLE_ID: &str = "dbpres_meta_tableId";
pub const META_TABLE: &str = "dbpres_meta_table";
pub const META_SCHEMA: &str = "dbpres_meta_schema";
pub const META_ROW_NUMBER: &str = "dbpres_meta_rowN";

/// Prefix of column name fields (`dbpres_meta_col_1`, ...)
pub const META_COLUMN_PREFIX: &str = "dbpres_meta_col_";

/// Prefix of column type fields (`dbpres_meta_colType_1`, ...)
pub const META_COLUMN_TYPE_PREFIX: &str = "dbpres_meta_colType_";

/// Data field holding the value of column `position`
pub fn data_field(position: usize) -> String {
    format!("{}{}", DATA_PREFIX, position)
}

/// Field-list pattern selecting every field with `prefix`
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{}*", prefix)
}

/// Composite table identifier, `schema.table`
pub fn table_id(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Suffix of `key` after `prefix`; `None` if the key lacks `prefix`
pub fn positional_suffix<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}
