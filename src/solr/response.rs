//! Typed decoding of backend responses
//!
//! The backend answers with `{ response: { numFound, docs }, facet_counts }`.
//! Facet lists arrive flattened as `[value, count, value, count, ...]` and
//! row documents carry their cells in positional `<prefix><N>` fields.

use super::fields::positional_suffix;
use crate::error::{Result, ViewerError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// One stored document as returned by the backend
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct SolrResponse {
    pub response: ResponseBody,
    #[serde(default)]
    pub facet_counts: Option<FacetCounts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub docs: Vec<Document>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacetCounts {
    #[serde(default)]
    pub facet_fields: HashMap<String, Vec<Value>>,
}

impl SolrResponse {
    /// Parse a raw response body
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Values of facet `field` that have at least one match
    pub fn facet_values(&self, field: &str) -> Result<Vec<String>> {
        let pairs = self
            .facet_counts
            .as_ref()
            .and_then(|counts| counts.facet_fields.get(field))
            .ok_or_else(|| ViewerError::malformed(format!("missing facet field '{}'", field)))?;
        reduce_facet_pairs(pairs)
    }

    pub fn first_doc(&self) -> Option<&Document> {
        self.response.docs.first()
    }
}

/// Keep each facet value whose count is strictly positive, in backend order
pub fn reduce_facet_pairs(pairs: &[Value]) -> Result<Vec<String>> {
    if pairs.len() % 2 != 0 {
        return Err(ViewerError::malformed(format!(
            "facet list has odd length {}",
            pairs.len()
        )));
    }

    let mut values = Vec::new();
    for pair in pairs.chunks_exact(2) {
        let value = pair[0]
            .as_str()
            .ok_or_else(|| ViewerError::malformed(format!("facet value {} is not a string", pair[0])))?;
        let count = pair[1]
            .as_i64()
            .ok_or_else(|| ViewerError::malformed(format!("facet count {} is not an integer", pair[1])))?;
        if count > 0 {
            values.push(value.to_string());
        }
    }
    Ok(values)
}

/// Map positional keys of `doc` to their position, ignoring keys without `prefix`
fn positions<'a>(doc: &'a Document, prefix: &str) -> Result<BTreeMap<usize, &'a Value>> {
    let mut by_position = BTreeMap::new();
    for (key, value) in doc {
        let Some(suffix) = positional_suffix(key, prefix) else {
            continue;
        };
        let position: usize = suffix
            .parse()
            .map_err(|_| ViewerError::malformed(format!("field '{}' has no numeric position", key)))?;
        if position == 0 {
            return Err(ViewerError::malformed(format!(
                "field '{}' uses position 0; positions start at 1",
                key
            )));
        }
        by_position.insert(position, value);
    }
    Ok(by_position)
}

/// Ordered values of `prefix1..prefixK`, where K is the highest position present
///
/// Every position from 1 to K must be present.
pub fn reassemble_contiguous(doc: &Document, prefix: &str) -> Result<Vec<Value>> {
    let by_position = positions(doc, prefix)?;
    let mut values = Vec::with_capacity(by_position.len());
    for (index, (position, value)) in by_position.into_iter().enumerate() {
        if position != index + 1 {
            return Err(ViewerError::malformed(format!(
                "missing field '{}{}'",
                prefix,
                index + 1
            )));
        }
        values.push(value.clone());
    }
    Ok(values)
}

/// Ordered values of `prefix1..prefix<width>`; absent cells become null
pub fn reassemble_row(doc: &Document, prefix: &str, width: usize) -> Result<Vec<Value>> {
    let by_position = positions(doc, prefix)?;
    if let Some((&position, _)) = by_position.iter().next_back() {
        if position > width {
            return Err(ViewerError::malformed(format!(
                "field '{}{}' is beyond the table's {} columns",
                prefix, position, width
            )));
        }
    }
    Ok((1..=width)
        .map(|position| by_position.get(&position).map_or(Value::Null, |v| (*v).clone()))
        .collect())
}

/// Reassemble every row document to `width` columns
pub fn rows_from_documents(docs: &[Document], prefix: &str, width: usize) -> Result<Vec<Vec<Value>>> {
    docs.iter()
        .map(|doc| reassemble_row(doc, prefix, width))
        .collect()
}

/// Display text of a cell value
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solr::fields::{DATA_PREFIX, META_COLUMN_PREFIX};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_facet_reduction_keeps_positive_counts_in_order() {
        let pairs = vec![json!("finance"), json!(3), json!("archive"), json!(0), json!("sales"), json!(7)];
        assert_eq!(reduce_facet_pairs(&pairs).unwrap(), vec!["finance", "sales"]);
    }

    #[test]
    fn test_facet_reduction_empty() {
        assert!(reduce_facet_pairs(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_facet_reduction_rejects_odd_length() {
        let pairs = vec![json!("finance"), json!(3), json!("orphan")];
        assert!(matches!(
            reduce_facet_pairs(&pairs),
            Err(ViewerError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_facet_reduction_rejects_non_integer_count() {
        let pairs = vec![json!("finance"), json!("3")];
        assert!(reduce_facet_pairs(&pairs).is_err());
    }

    #[test]
    fn test_reassemble_in_position_order() {
        let row = doc(json!({"dbpres_data_2": "30", "dbpres_data_1": "Alice"}));
        assert_eq!(
            reassemble_contiguous(&row, DATA_PREFIX).unwrap(),
            vec![json!("Alice"), json!("30")]
        );
    }

    #[test]
    fn test_reassemble_ignores_fields_without_prefix() {
        // An extra id field used to inflate the column count and shift values
        let row = doc(json!({
            "dbpres_meta_id": "hr.employees.1",
            "dbpres_data_1": "Alice",
            "dbpres_data_2": "30"
        }));
        assert_eq!(
            reassemble_contiguous(&row, DATA_PREFIX).unwrap(),
            vec![json!("Alice"), json!("30")]
        );
        assert_eq!(reassemble_row(&row, DATA_PREFIX, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_reassemble_counts_past_nine_numerically() {
        let mut fields = Map::new();
        for n in 1..=11 {
            fields.insert(format!("dbpres_meta_col_{}", n), json!(format!("c{}", n)));
        }
        let columns = reassemble_contiguous(&fields, META_COLUMN_PREFIX).unwrap();
        assert_eq!(columns[9], json!("c10"));
        assert_eq!(columns[10], json!("c11"));
    }

    #[test]
    fn test_contiguous_rejects_gaps() {
        let meta = doc(json!({"dbpres_meta_col_1": "name", "dbpres_meta_col_3": "age"}));
        let err = reassemble_contiguous(&meta, META_COLUMN_PREFIX).unwrap_err();
        assert!(err.to_string().contains("dbpres_meta_col_2"));
    }

    #[test]
    fn test_non_numeric_suffix_is_malformed() {
        let row = doc(json!({"dbpres_data_x": "?"}));
        assert!(reassemble_contiguous(&row, DATA_PREFIX).is_err());
        let zero = doc(json!({"dbpres_data_0": "?"}));
        assert!(reassemble_row(&zero, DATA_PREFIX, 1).is_err());
    }

    #[test]
    fn test_row_fills_absent_cells_with_null() {
        let row = doc(json!({"dbpres_data_1": "Alice", "dbpres_data_3": "Lisbon"}));
        assert_eq!(
            reassemble_row(&row, DATA_PREFIX, 3).unwrap(),
            vec![json!("Alice"), Value::Null, json!("Lisbon")]
        );
    }

    #[test]
    fn test_row_wider_than_table_is_malformed() {
        let row = doc(json!({"dbpres_data_1": "a", "dbpres_data_4": "d"}));
        assert!(reassemble_row(&row, DATA_PREFIX, 3).is_err());
    }

    #[test]
    fn test_decode_full_response() {
        let body = r#"{
            "responseHeader": {"status": 0},
            "response": {"numFound": 2, "start": 0, "docs": [{"dbpres_data_1": "x"}]},
            "facet_counts": {"facet_fields": {"dbpres_meta_schema": ["hr", 1, "sales", 4]}}
        }"#;
        let response = SolrResponse::from_json(body).unwrap();
        assert_eq!(response.response.num_found, 2);
        assert_eq!(response.response.docs.len(), 1);
        assert_eq!(
            response.facet_values("dbpres_meta_schema").unwrap(),
            vec!["hr", "sales"]
        );
        assert!(response.facet_values("dbpres_meta_table").is_err());
    }

    #[test]
    fn test_decode_rejects_unexpected_shape() {
        assert!(matches!(
            SolrResponse::from_json(r#"{"error": {"msg": "undefined field"}}"#),
            Err(ViewerError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("a")), "a");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!(["a", "b"])), "a, b");
    }
}
