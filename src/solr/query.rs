//! Query building for the search backend
//!
//! Builders are pure: they only translate a logical request into a
//! [`SolrQuery`]. Input validation happens in the service layer.

use super::fields::{
    data_field, prefix_pattern, DATA_PREFIX, META_COLUMN_PREFIX, META_COLUMN_TYPE_PREFIX,
    META_ROW_NUMBER, META_SCHEMA, META_TABLE, META_TABLE_ID,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction as understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort on a single backend field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Sort on the data field of column `position`
    pub fn column(position: usize, direction: SortDirection) -> Self {
        Self::new(data_field(position), direction)
    }

    pub fn to_param(&self) -> String {
        format!("{} {}", self.field, self.direction)
    }
}

/// Pagination window: `rows` documents starting at offset `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub start: usize,
    pub rows: usize,
}

impl PageWindow {
    pub fn new(start: usize, rows: usize) -> Self {
        Self { start, rows }
    }

    /// Window showing 1-based page `page` with `rows` per page
    pub fn for_page(page: usize, rows: usize) -> Self {
        Self {
            start: page.saturating_sub(1) * rows,
            rows,
        }
    }

    /// 1-based page the window starts on
    pub fn current_page(&self) -> usize {
        if self.rows == 0 {
            return 1;
        }
        self.start / self.rows + 1
    }

    /// Number of pages needed for `total` matches; at least one
    pub fn num_pages(&self, total: u64) -> usize {
        if self.rows == 0 || total == 0 {
            return 1;
        }
        let total = total as usize;
        (total + self.rows - 1) / self.rows
    }
}

/// A complete parameter set for one backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrQuery {
    pub q: String,
    pub fl: Option<String>,
    pub sort: Option<String>,
    pub start: Option<usize>,
    pub rows: Option<usize>,
    pub facet_field: Option<String>,
}

impl SolrQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            fl: None,
            sort: None,
            start: None,
            rows: None,
            facet_field: None,
        }
    }

    pub fn fields(mut self, fl: impl Into<String>) -> Self {
        self.fl = Some(fl.into());
        self
    }

    pub fn sort(mut self, sort: &SortSpec) -> Self {
        self.sort = Some(sort.to_param());
        self
    }

    pub fn window(mut self, start: usize, rows: usize) -> Self {
        self.start = Some(start);
        self.rows = Some(rows);
        self
    }

    pub fn facet(mut self, field: impl Into<String>) -> Self {
        self.facet_field = Some(field.into());
        self
    }

    /// Wire parameters, in a stable order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q.clone()), ("wt", "json".to_string())];
        if let Some(fl) = &self.fl {
            params.push(("fl", fl.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(rows) = self.rows {
            params.push(("rows", rows.to_string()));
        }
        if let Some(field) = &self.facet_field {
            params.push(("facet", "true".to_string()));
            params.push(("facet.field", field.clone()));
        }
        params
    }
}

/// Escape a literal value for the Lucene query syntax
pub fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_whitespace() || "+-&|!(){}[]^\"~*?:\\/".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn field_equals(field: &str, value: &str) -> String {
    format!("{}:{}", field, escape_query_value(value))
}

fn table_filter(table_id: &str) -> String {
    field_equals(META_TABLE_ID, table_id)
}

/// Distinct schema names
pub fn schemas_query() -> SolrQuery {
    SolrQuery::new("*:*").window(0, 0).facet(META_SCHEMA)
}

/// Distinct table names, optionally restricted to one schema
pub fn tables_query(schema: Option<&str>) -> SolrQuery {
    let q = match schema {
        Some(schema) => field_equals(META_SCHEMA, schema),
        None => format!("{}:*", META_SCHEMA),
    };
    SolrQuery::new(q).window(0, 0).facet(META_TABLE)
}

/// Column names of a table; metadata is repeated on every row so one doc suffices
pub fn columns_query(table_id: &str) -> SolrQuery {
    SolrQuery::new(table_filter(table_id))
        .fields(prefix_pattern(META_COLUMN_PREFIX))
        .window(0, 1)
}

pub fn column_types_query(table_id: &str) -> SolrQuery {
    SolrQuery::new(table_filter(table_id))
        .fields(prefix_pattern(META_COLUMN_TYPE_PREFIX))
        .window(0, 1)
}

/// One page of row data
pub fn rows_query(table_id: &str, window: PageWindow, sort: &SortSpec) -> SolrQuery {
    SolrQuery::new(table_filter(table_id))
        .fields(prefix_pattern(DATA_PREFIX))
        .window(window.start, window.rows)
        .sort(sort)
}

/// Only `numFound` of the response is used
pub fn row_count_query(table_id: &str) -> SolrQuery {
    SolrQuery::new(table_filter(table_id)).window(0, 0)
}

/// Rows of a table matching `text` anywhere in the document, in row order
pub fn search_query(table_id: &str, text: &str) -> SolrQuery {
    let mut q = table_filter(table_id);
    if !text.is_empty() {
        q.push_str(&format!(" AND *{}*", escape_query_value(text)));
    }
    SolrQuery::new(q)
        .fields(prefix_pattern(DATA_PREFIX))
        .sort(&SortSpec::new(META_ROW_NUMBER, SortDirection::Asc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(query: &SolrQuery, name: &str) -> Option<String> {
        query
            .to_params()
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    #[test]
    fn test_schemas_query_is_unfiltered_facet() {
        let query = schemas_query();
        assert_eq!(query.q, "*:*");
        assert_eq!(
            param(&query, "facet.field").as_deref(),
            Some("dbpres_meta_schema")
        );
        assert_eq!(query.rows, Some(0));
        assert!(query.to_params().contains(&("facet", "true".to_string())));
    }

    #[test]
    fn test_tables_query_filter() {
        assert_eq!(tables_query(Some("sales")).q, "dbpres_meta_schema:sales");
        assert_eq!(tables_query(None).q, "dbpres_meta_schema:*");
        assert_eq!(
            tables_query(None).facet_field.as_deref(),
            Some("dbpres_meta_table")
        );
    }

    #[test]
    fn test_column_meta_queries_fetch_single_doc() {
        let cols = columns_query("sales.orders");
        assert_eq!(cols.q, "dbpres_meta_tableId:sales.orders");
        assert_eq!(cols.fl.as_deref(), Some("dbpres_meta_col_*"));
        assert_eq!((cols.start, cols.rows), (Some(0), Some(1)));

        let types = column_types_query("sales.orders");
        assert_eq!(types.fl.as_deref(), Some("dbpres_meta_colType_*"));
        assert_eq!(types.rows, Some(1));
    }

    #[test]
    fn test_rows_query_window_and_sort() {
        let query = rows_query(
            "sales.orders",
            PageWindow::new(20, 10),
            &SortSpec::column(3, SortDirection::Desc),
        );
        assert_eq!(query.fl.as_deref(), Some("dbpres_data_*"));
        assert_eq!(query.sort.as_deref(), Some("dbpres_data_3 DESC"));
        assert_eq!((query.start, query.rows), (Some(20), Some(10)));
        assert_eq!(param(&query, "start").as_deref(), Some("20"));
    }

    #[test]
    fn test_row_count_query_has_no_field_list() {
        let query = row_count_query("hr.employees");
        assert_eq!(query.fl, None);
        assert_eq!(query.q, "dbpres_meta_tableId:hr.employees");
    }

    #[test]
    fn test_search_query() {
        let plain = search_query("hr.employees", "");
        assert_eq!(plain.q, "dbpres_meta_tableId:hr.employees");
        assert_eq!(plain.sort.as_deref(), Some("dbpres_meta_rowN ASC"));
        assert_eq!(plain.rows, None);

        let text = search_query("hr.employees", "ali");
        assert_eq!(text.q, "dbpres_meta_tableId:hr.employees AND *ali*");
    }

    #[test]
    fn test_search_text_is_escaped() {
        let query = search_query("hr.employees", "a b:c");
        assert_eq!(query.q, r"dbpres_meta_tableId:hr.employees AND *a\ b\:c*");
    }

    #[test]
    fn test_params_always_request_json() {
        let params = row_count_query("a.b").to_params();
        assert_eq!(params[0], ("q", "dbpres_meta_tableId:a.b".to_string()));
        assert_eq!(params[1], ("wt", "json".to_string()));
    }

    #[test]
    fn test_page_window_math() {
        let window = PageWindow::for_page(3, 25);
        assert_eq!(window.start, 50);
        assert_eq!(window.current_page(), 3);
        assert_eq!(window.num_pages(0), 1);
        assert_eq!(window.num_pages(50), 2);
        assert_eq!(window.num_pages(51), 3);
        assert_eq!(PageWindow::for_page(0, 10).start, 0);
    }
}
