use super::table_service::TableService;
use crate::data::{Catalog, Schema, Table};
use crate::error::{Result, ViewerError};
use crate::solr::transport::SolrTransport;
use futures::future::try_join_all;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Also fetch column names and types for every table up front
    pub load_column_metadata: bool,
}

/// Outcome of a discovery pass
#[derive(Debug, Clone)]
pub struct Discovery {
    pub catalog: Catalog,
    /// First table of the first schema, in backend order
    pub initial_table: String,
}

/// Discover every schema and table, then pick the initial table
///
/// Table lists of all schemas are requested concurrently and joined before
/// the initial selection is made.
pub async fn discover_catalog<T: SolrTransport>(
    service: &TableService<T>,
    options: DiscoveryOptions,
) -> Result<Discovery> {
    let schema_names = service.get_schemas().await?;
    if schema_names.is_empty() {
        return Err(ViewerError::NotFound("the index holds no schemas".to_string()));
    }

    let table_lists = try_join_all(
        schema_names
            .iter()
            .map(|schema| service.get_tables(Some(schema.as_str()))),
    )
    .await?;

    let mut seen = HashSet::new();
    let mut schemas = Vec::with_capacity(schema_names.len());
    for (name, table_names) in schema_names.into_iter().zip(table_lists) {
        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            let table = Table::new(&name, &table_name);
            if !seen.insert(table.id.clone()) {
                return Err(ViewerError::malformed(format!(
                    "table id '{}' is not unique",
                    table.id
                )));
            }
            tables.push(table);
        }
        schemas.push(Schema { name, tables });
    }
    let mut catalog = Catalog { schemas };

    if options.load_column_metadata {
        let ids = catalog.table_ids();
        let columns = try_join_all(ids.iter().map(|id| service.get_table_columns(id))).await?;
        for (id, columns) in ids.iter().zip(columns) {
            catalog.set_columns(id, columns);
        }
    }

    let initial_table = catalog
        .first_table()
        .map(|t| t.id.clone())
        .ok_or_else(|| ViewerError::NotFound("no tables in any schema".to_string()))?;

    info!(
        target: "discovery",
        "Discovered {} schemas, {} tables; initial table {}",
        catalog.schemas.len(),
        catalog.tables().count(),
        initial_table
    );

    Ok(Discovery {
        catalog,
        initial_table,
    })
}
