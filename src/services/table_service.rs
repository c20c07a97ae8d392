use crate::data::{Column, Row};
use crate::error::{Result, ViewerError};
use crate::solr::fields::{DATA_PREFIX, META_COLUMN_PREFIX, META_COLUMN_TYPE_PREFIX, META_SCHEMA, META_TABLE};
use crate::solr::query::{self, PageWindow, SortSpec};
use crate::solr::response::{cell_text, reassemble_contiguous, rows_from_documents, Document};
use crate::solr::transport::SolrTransport;
use tracing::{debug, info};

/// Documents matched by a free-text search
#[derive(Debug, Clone)]
pub struct SearchHits {
    pub docs: Vec<Document>,
    pub num_found: u64,
}

impl SearchHits {
    pub fn into_rows(self, width: usize) -> Result<(Vec<Row>, u64)> {
        let rows = rows_from_documents(&self.docs, DATA_PREFIX, width)?;
        Ok((rows, self.num_found))
    }
}

/// Metadata and row operations over the preservation index
pub struct TableService<T: SolrTransport> {
    transport: T,
}

fn require_table_id(table_id: &str) -> Result<()> {
    if table_id.trim().is_empty() {
        return Err(ViewerError::InvalidInput("table id is empty".to_string()));
    }
    Ok(())
}

impl<T: SolrTransport> TableService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Distinct schema names with at least one row
    pub async fn get_schemas(&self) -> Result<Vec<String>> {
        let response = self.transport.execute(&query::schemas_query()).await?;
        let schemas = response.facet_values(META_SCHEMA)?;
        info!(target: "service", "Found {} schemas", schemas.len());
        Ok(schemas)
    }

    /// Distinct table names, optionally restricted to `schema`
    pub async fn get_tables(&self, schema: Option<&str>) -> Result<Vec<String>> {
        let response = self.transport.execute(&query::tables_query(schema)).await?;
        let tables = response.facet_values(META_TABLE)?;
        debug!(
            target: "service",
            "Schema {} has {} tables",
            schema.unwrap_or("*"),
            tables.len()
        );
        Ok(tables)
    }

    async fn column_metadata(&self, table_id: &str, query: query::SolrQuery, prefix: &str) -> Result<Vec<String>> {
        require_table_id(table_id)?;
        let response = self.transport.execute(&query).await?;
        let doc = response
            .first_doc()
            .ok_or_else(|| ViewerError::NotFound(format!("no documents for table '{}'", table_id)))?;
        let values = reassemble_contiguous(doc, prefix)?;
        Ok(values.iter().map(cell_text).collect())
    }

    pub async fn get_columns(&self, table_id: &str) -> Result<Vec<String>> {
        self.column_metadata(table_id, query::columns_query(table_id), META_COLUMN_PREFIX)
            .await
    }

    pub async fn get_column_types(&self, table_id: &str) -> Result<Vec<String>> {
        self.column_metadata(
            table_id,
            query::column_types_query(table_id),
            META_COLUMN_TYPE_PREFIX,
        )
        .await
    }

    /// Column names and types, fetched concurrently
    pub async fn get_table_columns(&self, table_id: &str) -> Result<Vec<Column>> {
        let (names, types) =
            tokio::try_join!(self.get_columns(table_id), self.get_column_types(table_id))?;
        Ok(Column::from_metadata(names, types))
    }

    /// One page of row documents, still keyed by positional field
    pub async fn get_row_documents(
        &self,
        table_id: &str,
        window: PageWindow,
        sort: &SortSpec,
    ) -> Result<Vec<Document>> {
        require_table_id(table_id)?;
        if window.rows == 0 {
            return Err(ViewerError::InvalidInput("page size must be positive".to_string()));
        }
        let response = self
            .transport
            .execute(&query::rows_query(table_id, window, sort))
            .await?;
        Ok(response.response.docs)
    }

    /// One page of rows reassembled to `width` columns
    pub async fn get_rows(
        &self,
        table_id: &str,
        window: PageWindow,
        sort: &SortSpec,
        width: usize,
    ) -> Result<Vec<Row>> {
        let docs = self.get_row_documents(table_id, window, sort).await?;
        rows_from_documents(&docs, DATA_PREFIX, width)
    }

    pub async fn get_row_count(&self, table_id: &str) -> Result<u64> {
        require_table_id(table_id)?;
        let response = self
            .transport
            .execute(&query::row_count_query(table_id))
            .await?;
        Ok(response.response.num_found)
    }

    /// Rows of `table_id` containing `text`; an empty text matches every row
    pub async fn search(&self, table_id: &str, text: &str) -> Result<SearchHits> {
        require_table_id(table_id)?;
        let response = self
            .transport
            .execute(&query::search_query(table_id, text.trim()))
            .await?;
        info!(
            target: "service",
            "Search '{}' in {} matched {} rows",
            text,
            table_id,
            response.response.num_found
        );
        Ok(SearchHits {
            num_found: response.response.num_found,
            docs: response.response.docs,
        })
    }
}
