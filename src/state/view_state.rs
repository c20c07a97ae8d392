//! Table view state and its reducer
//!
//! The state is a plain value. Every change produces a new state through
//! [`reduce`]; nothing mutates it in place.

use super::events::ViewAction;
use crate::data::{Column, Row};
use crate::solr::query::{PageWindow, SortDirection, SortSpec};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort on a 1-based column number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSort {
    pub column: usize,
    pub direction: SortDirection,
}

impl ColumnSort {
    pub fn first_column() -> Self {
        Self {
            column: 1,
            direction: SortDirection::Asc,
        }
    }

    /// Same column toggles the direction; another column starts ascending
    pub fn select(self, column: usize) -> Self {
        if column == self.column {
            Self {
                column,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                column,
                direction: SortDirection::Asc,
            }
        }
    }

    pub fn to_spec(&self) -> SortSpec {
        SortSpec::column(self.column, self.direction)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableViewState {
    pub table_id: Option<String>,
    pub window: PageWindow,
    pub sort: ColumnSort,
    /// Free-text search; empty when browsing pages
    pub query: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Total rows in the table
    pub num_found: u64,
    /// Rows matched by the active search
    pub search_hits: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for TableViewState {
    fn default() -> Self {
        Self {
            table_id: None,
            window: PageWindow::new(0, DEFAULT_PAGE_SIZE),
            sort: ColumnSort::first_column(),
            query: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            num_found: 0,
            search_hits: None,
            loading: false,
            error: None,
        }
    }
}

impl TableViewState {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn num_pages(&self) -> usize {
        self.window.num_pages(self.num_found)
    }

    pub fn current_page(&self) -> usize {
        self.window.current_page()
    }

    pub fn is_searching(&self) -> bool {
        self.search_hits.is_some() || !self.query.is_empty()
    }
}

/// Compute the state that follows `action`
pub fn reduce(state: &TableViewState, action: ViewAction) -> TableViewState {
    match action {
        ViewAction::SelectTable {
            table_id,
            page_size,
        } => TableViewState {
            table_id: Some(table_id),
            window: PageWindow::new(0, page_size),
            loading: true,
            ..TableViewState::default()
        },

        ViewAction::TableLoaded {
            columns,
            rows,
            num_found,
        } => TableViewState {
            columns,
            rows,
            num_found,
            loading: false,
            error: None,
            ..state.clone()
        },

        ViewAction::SortBy(column) => TableViewState {
            sort: state.sort.select(column),
            query: String::new(),
            search_hits: None,
            loading: true,
            ..state.clone()
        },

        ViewAction::ChangePage(window) => TableViewState {
            window,
            query: String::new(),
            search_hits: None,
            loading: true,
            ..state.clone()
        },

        ViewAction::RowsLoaded(rows) => TableViewState {
            rows,
            loading: false,
            error: None,
            ..state.clone()
        },

        ViewAction::Search(query) => TableViewState {
            query,
            loading: true,
            ..state.clone()
        },

        ViewAction::SearchLoaded { rows, num_found } => TableViewState {
            rows,
            search_hits: Some(num_found),
            loading: false,
            error: None,
            ..state.clone()
        },

        ViewAction::Failed(message) => TableViewState {
            loading: false,
            error: Some(message),
            ..state.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> TableViewState {
        let state = reduce(
            &TableViewState::default(),
            ViewAction::SelectTable {
                table_id: "sales.orders".into(),
                page_size: 10,
            },
        );
        reduce(
            &state,
            ViewAction::TableLoaded {
                columns: Column::from_metadata(
                    vec!["ref".into(), "total".into(), "currency".into()],
                    vec![],
                ),
                rows: vec![vec![json!("a"), json!(1), json!("EUR")]],
                num_found: 42,
            },
        )
    }

    #[test]
    fn test_sort_toggles_on_same_column() {
        let sort = ColumnSort {
            column: 3,
            direction: SortDirection::Asc,
        };
        assert_eq!(sort.select(3).direction, SortDirection::Desc);
        assert_eq!(sort.select(3).select(3).direction, SortDirection::Asc);
    }

    #[test]
    fn test_sort_other_column_starts_ascending() {
        let sort = ColumnSort {
            column: 3,
            direction: SortDirection::Desc,
        };
        assert_eq!(
            sort.select(4),
            ColumnSort {
                column: 4,
                direction: SortDirection::Asc
            }
        );
        assert_eq!(sort.select(4).to_spec().to_param(), "dbpres_data_4 ASC");
    }

    #[test]
    fn test_select_table_resets_view() {
        let mut state = loaded();
        state = reduce(&state, ViewAction::ChangePage(PageWindow::new(30, 25)));
        state = reduce(&state, ViewAction::SortBy(2));
        state = reduce(&state, ViewAction::Search("x".into()));

        let state = reduce(
            &state,
            ViewAction::SelectTable {
                table_id: "hr.employees".into(),
                page_size: 10,
            },
        );
        assert_eq!(state.table_id.as_deref(), Some("hr.employees"));
        assert_eq!(state.window, PageWindow::new(0, 10));
        assert_eq!(state.sort, ColumnSort::first_column());
        assert!(state.query.is_empty());
        assert!(state.rows.is_empty());
        assert!(state.loading);
    }

    #[test]
    fn test_loaded_state_and_paging() {
        let state = loaded();
        assert!(!state.loading);
        assert_eq!(state.width(), 3);
        assert_eq!(state.num_pages(), 5);
        assert_eq!(state.current_page(), 1);

        let state = reduce(&state, ViewAction::ChangePage(PageWindow::for_page(5, 10)));
        assert_eq!(state.current_page(), 5);
        assert_eq!(state.columns.len(), 3);
    }

    #[test]
    fn test_search_then_sort_leaves_search() {
        let state = reduce(&loaded(), ViewAction::Search("EUR".into()));
        let state = reduce(
            &state,
            ViewAction::SearchLoaded {
                rows: vec![],
                num_found: 0,
            },
        );
        assert!(state.is_searching());
        assert_eq!(state.search_hits, Some(0));

        let state = reduce(&state, ViewAction::SortBy(1));
        assert!(!state.is_searching());
        assert_eq!(state.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_failure_keeps_previous_rows() {
        let state = reduce(&loaded(), ViewAction::SortBy(2));
        let state = reduce(&state, ViewAction::Failed("backend down".into()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("backend down"));
        assert_eq!(state.rows.len(), 1);

        let state = reduce(&state, ViewAction::RowsLoaded(vec![]));
        assert_eq!(state.error, None);
    }
}
