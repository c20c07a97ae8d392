//! Actions that drive the table view

use crate::data::{Column, Row};
use crate::solr::query::PageWindow;

/// Everything that can change the table view
///
/// User intents start a new request; the `*Loaded` and `Failed` actions carry
/// the outcome of that request back.
#[derive(Debug, Clone)]
pub enum ViewAction {
    /// Show a table from its first page
    SelectTable { table_id: String, page_size: usize },

    /// Metadata, first page and count arrived for the selected table
    TableLoaded {
        columns: Vec<Column>,
        rows: Vec<Row>,
        num_found: u64,
    },

    /// Sort by a 1-based column number
    SortBy(usize),

    /// Move to another pagination window
    ChangePage(PageWindow),

    /// A page of rows arrived
    RowsLoaded(Vec<Row>),

    /// Free-text search; empty text lists rows unfiltered
    Search(String),

    SearchLoaded { rows: Vec<Row>, num_found: u64 },

    Failed(String),
}

impl ViewAction {
    /// Short name for logs and history
    pub fn name(&self) -> &'static str {
        match self {
            ViewAction::SelectTable { .. } => "SelectTable",
            ViewAction::TableLoaded { .. } => "TableLoaded",
            ViewAction::SortBy(_) => "SortBy",
            ViewAction::ChangePage(_) => "ChangePage",
            ViewAction::RowsLoaded(_) => "RowsLoaded",
            ViewAction::Search(_) => "Search",
            ViewAction::SearchLoaded { .. } => "SearchLoaded",
            ViewAction::Failed(_) => "Failed",
        }
    }

    /// Whether this action starts a new request
    pub fn is_intent(&self) -> bool {
        matches!(
            self,
            ViewAction::SelectTable { .. }
                | ViewAction::SortBy(_)
                | ViewAction::ChangePage(_)
                | ViewAction::Search(_)
        )
    }
}
