//! Schemas, tables and columns discovered from the index

use crate::solr::fields;
use serde_json::Value;

/// A row reassembled into column order
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// 1-based position, the numeric suffix of its data field
    pub position: usize,
    pub name: String,
    /// Declared type as recorded at export; informational only
    pub type_tag: String,
}

impl Column {
    /// Zip reassembled name and type lists into columns
    ///
    /// Type tags missing from a shorter type list are left empty.
    pub fn from_metadata(names: Vec<String>, types: Vec<String>) -> Vec<Column> {
        let mut types = types.into_iter();
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Column {
                position: index + 1,
                name,
                type_tag: types.next().unwrap_or_default(),
            })
            .collect()
    }

    pub fn data_field(&self) -> String {
        fields::data_field(self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    /// `schema.table`
    pub id: String,
    /// Loaded lazily, or during discovery when column metadata is requested
    pub columns: Option<Vec<Column>>,
}

impl Table {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: fields::table_id(schema, name),
            columns: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

/// Everything discovered in the index, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub schemas: Vec<Schema>,
}

impl Catalog {
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables().find(|t| t.id == table_id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.iter().flat_map(|s| s.tables.iter())
    }

    pub fn table_ids(&self) -> Vec<String> {
        self.tables().map(|t| t.id.clone()).collect()
    }

    /// First table of the first schema that has any
    pub fn first_table(&self) -> Option<&Table> {
        self.tables().next()
    }

    pub fn set_columns(&mut self, table_id: &str, columns: Vec<Column>) -> bool {
        for schema in &mut self.schemas {
            if let Some(table) = schema.tables.iter_mut().find(|t| t.id == table_id) {
                table.columns = Some(columns);
                return true;
            }
        }
        false
    }
}
