//! In-memory stand-in for the search backend
//!
//! Understands the subset of the query language the builders emit:
//! `*:*`, `field:value`, `field:*`, and an optional `AND *text*` clause.

use super::fields::{
    table_id, DATA_PREFIX, META_COLUMN_PREFIX, META_COLUMN_TYPE_PREFIX, META_ID, META_ROW_NUMBER,
    META_SCHEMA, META_TABLE, META_TABLE_ID,
};
use super::query::SolrQuery;
use super::response::{cell_text, Document, SolrResponse};
use super::transport::SolrTransport;
use crate::error::{Result, ViewerError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_ROWS: usize = 10;

#[derive(Default)]
pub struct MockTransport {
    docs: Vec<Document>,
    received: Mutex<Vec<SolrQuery>>,
    delays: Vec<(String, Duration)>,
    failures: Vec<(String, String)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a table: one document per row, metadata repeated on each row
    pub fn with_table(
        mut self,
        schema: &str,
        table: &str,
        columns: &[(&str, &str)],
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let id = table_id(schema, table);
        for (row_number, cells) in rows.into_iter().enumerate() {
            let mut doc = Document::new();
            doc.insert(META_ID.to_string(), json!(format!("{}.{}", id, row_number)));
            doc.insert(META_TABLE_ID.to_string(), json!(id));
            doc.insert(META_TABLE.to_string(), json!(table));
            doc.insert(META_SCHEMA.to_string(), json!(schema));
            doc.insert(META_ROW_NUMBER.to_string(), json!(row_number));
            for (index, (name, type_tag)) in columns.iter().enumerate() {
                let position = index + 1;
                doc.insert(format!("{}{}", META_COLUMN_PREFIX, position), json!(name));
                doc.insert(format!("{}{}", META_COLUMN_TYPE_PREFIX, position), json!(type_tag));
            }
            for (index, cell) in cells.into_iter().enumerate() {
                // the index does not store null cells
                if !cell.is_null() {
                    doc.insert(format!("{}{}", DATA_PREFIX, index + 1), cell);
                }
            }
            self.docs.push(doc);
        }
        self
    }

    /// Add a raw document as-is
    pub fn with_document(mut self, doc: Document) -> Self {
        self.docs.push(doc);
        self
    }

    /// Delay answers to queries whose `q` or field list contains `needle`
    pub fn with_delay(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    /// Fail queries whose `q` contains `needle` with a transport error
    pub fn with_failure(mut self, needle: &str, message: &str) -> Self {
        self.failures.push((needle.to_string(), message.to_string()));
        self
    }

    /// Every query received so far, in arrival order
    pub fn received(&self) -> Vec<SolrQuery> {
        self.received
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    fn answer(&self, query: &SolrQuery) -> Value {
        let mut matching: Vec<&Document> =
            self.docs.iter().filter(|doc| matches(doc, &query.q)).collect();
        let num_found = matching.len();

        if let Some(sort) = &query.sort {
            let mut parts = sort.split_whitespace();
            let field = parts.next().unwrap_or_default().to_string();
            let descending = parts
                .next()
                .map_or(false, |dir| dir.eq_ignore_ascii_case("desc"));
            matching.sort_by(|a, b| {
                let ordering = compare_field(a, b, &field);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let start = query.start.unwrap_or(0);
        let rows = query.rows.unwrap_or(DEFAULT_ROWS);
        let docs: Vec<Value> = matching
            .iter()
            .skip(start)
            .take(rows)
            .map(|doc| Value::Object(project(doc, query.fl.as_deref())))
            .collect();

        let mut body = json!({
            "responseHeader": {"status": 0},
            "response": {"numFound": num_found, "start": start, "docs": docs},
        });

        if let Some(field) = &query.facet_field {
            let mut fields = Map::new();
            fields.insert(field.clone(), Value::Array(self.facet_pairs(field, &matching)));
            body["facet_counts"] = json!({ "facet_fields": fields });
        }
        body
    }

    /// Every value in the index is listed, with zero counts for non-matching ones
    fn facet_pairs(&self, field: &str, matching: &[&Document]) -> Vec<Value> {
        let mut values: Vec<String> = Vec::new();
        for doc in &self.docs {
            if let Some(value) = doc.get(field).map(cell_text) {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        let mut pairs = Vec::with_capacity(values.len() * 2);
        for value in values {
            let count = matching
                .iter()
                .filter(|doc| doc.get(field).map(cell_text).as_deref() == Some(value.as_str()))
                .count();
            pairs.push(json!(value));
            pairs.push(json!(count));
        }
        pairs
    }
}

#[async_trait]
impl SolrTransport for MockTransport {
    async fn execute(&self, query: &SolrQuery) -> Result<SolrResponse> {
        if let Ok(mut received) = self.received.lock() {
            received.push(query.clone());
        }

        let delayed = |needle: &String| {
            query.q.contains(needle.as_str())
                || query.fl.as_deref().map_or(false, |fl| fl.contains(needle.as_str()))
        };
        if let Some((_, delay)) = self.delays.iter().find(|(needle, _)| delayed(needle)) {
            tokio::time::sleep(*delay).await;
        }

        if let Some((_, message)) = self.failures.iter().find(|(needle, _)| query.q.contains(needle)) {
            return Err(ViewerError::Transport {
                url: "mock://solr".to_string(),
                message: message.clone(),
            });
        }

        Ok(serde_json::from_value(self.answer(query))?)
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn matches(doc: &Document, q: &str) -> bool {
    let (filter, text) = match q.split_once(" AND ") {
        Some((filter, text)) => (filter, Some(text)),
        None => (q, None),
    };

    let filter_ok = match filter.split_once(':') {
        _ if filter == "*:*" => true,
        Some((field, "*")) => doc.contains_key(field),
        Some((field, value)) => {
            doc.get(field).map(cell_text).as_deref() == Some(unescape(value).as_str())
        }
        None => false,
    };

    let text_ok = match text {
        Some(pattern) => {
            let needle = unescape(pattern.trim_start_matches('*').trim_end_matches('*'));
            doc.values().any(|value| cell_text(value).contains(&needle))
        }
        None => true,
    };

    filter_ok && text_ok
}

fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    let left = a.get(field).map(cell_text).unwrap_or_default();
    let right = b.get(field).map(cell_text).unwrap_or_default();
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(&right),
    }
}

fn project(doc: &Document, fl: Option<&str>) -> Document {
    match fl.and_then(|fl| fl.strip_suffix('*')) {
        Some(prefix) => doc
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => doc.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solr::query::{
        rows_query, schemas_query, search_query, PageWindow, SortDirection, SortSpec,
    };

    fn people() -> MockTransport {
        MockTransport::new().with_table(
            "hr",
            "employees",
            &[("name", "VARCHAR"), ("age", "INTEGER")],
            vec![
                vec![json!("Bob"), json!("41")],
                vec![json!("Alice"), json!("30")],
                vec![json!("Carol"), json!("9")],
            ],
        )
    }

    #[tokio::test]
    async fn test_mock_facets_and_numeric_sort() {
        let mock = people();
        let facets = mock.execute(&schemas_query()).await.unwrap();
        assert_eq!(facets.facet_values(META_SCHEMA).unwrap(), vec!["hr"]);

        let page = mock
            .execute(&rows_query(
                "hr.employees",
                PageWindow::new(0, 2),
                &SortSpec::column(2, SortDirection::Asc),
            ))
            .await
            .unwrap();
        assert_eq!(page.response.num_found, 3);
        assert_eq!(page.response.docs.len(), 2);
        assert_eq!(page.response.docs[0]["dbpres_data_1"], json!("Carol"));
        assert!(page.response.docs[0].get(META_ID).is_none());
    }

    #[tokio::test]
    async fn test_mock_search_and_recording() {
        let mock = people();
        let found = mock.execute(&search_query("hr.employees", "li")).await.unwrap();
        assert_eq!(found.response.num_found, 1);
        assert_eq!(mock.received().len(), 1);
    }
}
