use super::discovery::{discover_catalog, Discovery, DiscoveryOptions};
use super::table_service::TableService;
use crate::error::{Result, ViewerError};
use crate::solr::fields::DATA_PREFIX;
use crate::solr::query::PageWindow;
use crate::solr::response::rows_from_documents;
use crate::solr::transport::SolrTransport;
use crate::state::{RequestTicket, TableViewState, ViewAction, ViewDispatcher};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Orchestrates service calls for the displayed table
///
/// The dispatcher lock is only taken between awaits, so several user
/// actions may be in flight; only the latest one reaches the state.
pub struct TableViewController<T: SolrTransport> {
    service: TableService<T>,
    dispatcher: Mutex<ViewDispatcher>,
    default_page_size: usize,
}

impl<T: SolrTransport> TableViewController<T> {
    pub fn new(service: TableService<T>, default_page_size: usize) -> Self {
        Self {
            service,
            dispatcher: Mutex::new(ViewDispatcher::new()),
            default_page_size: default_page_size.max(1),
        }
    }

    pub fn service(&self) -> &TableService<T> {
        &self.service
    }

    /// Snapshot of the current view state
    pub fn state(&self) -> TableViewState {
        self.dispatcher().state().clone()
    }

    fn dispatcher(&self) -> MutexGuard<'_, ViewDispatcher> {
        self.dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, intent: ViewAction) -> (RequestTicket, TableViewState) {
        let mut dispatcher = self.dispatcher();
        let ticket = dispatcher.begin(intent);
        (ticket, dispatcher.state().clone())
    }

    fn finish(&self, ticket: RequestTicket, outcome: Result<Vec<ViewAction>>) -> Result<()> {
        let mut dispatcher = self.dispatcher();
        match outcome {
            Ok(actions) => {
                for action in actions {
                    dispatcher.complete(ticket, action)?;
                }
                Ok(())
            }
            Err(err) => {
                if dispatcher.is_current(ticket) {
                    warn!(target: "controller", "Request #{} failed: {}", ticket.generation(), err);
                    dispatcher.complete(ticket, ViewAction::Failed(err.to_string()))?;
                    Err(err)
                } else {
                    debug!(target: "controller", "Ignoring failure of superseded request: {}", err);
                    Err(ViewerError::Superseded {
                        generation: ticket.generation(),
                    })
                }
            }
        }
    }

    fn current_table(&self) -> Result<TableViewState> {
        let state = self.state();
        if state.table_id.is_none() {
            return Err(ViewerError::InvalidInput("no table selected".to_string()));
        }
        Ok(state)
    }

    /// Discover the catalog and show its first table
    pub async fn discover_and_show(&self, options: DiscoveryOptions) -> Result<Discovery> {
        let discovery = discover_catalog(&self.service, options).await?;
        self.select_table(&discovery.initial_table).await?;
        Ok(discovery)
    }

    /// Show `table_id` from its first page, sorted ascending on the first column
    pub async fn select_table(&self, table_id: &str) -> Result<()> {
        if table_id.trim().is_empty() {
            return Err(ViewerError::InvalidInput("table id is empty".to_string()));
        }
        info!(target: "controller", "Showing table {}", table_id);

        let (ticket, state) = self.begin(ViewAction::SelectTable {
            table_id: table_id.to_string(),
            page_size: self.default_page_size,
        });
        let outcome = self.fetch_page(&state).await;
        self.finish(ticket, outcome)
    }

    /// Sort by 1-based `column`, toggling direction when it is already sorted
    pub async fn sort_by(&self, column: usize) -> Result<()> {
        let state = self.current_table()?;
        if column == 0 || column > state.width() {
            return Err(ViewerError::InvalidInput(format!(
                "column {} is outside 1..={}",
                column,
                state.width()
            )));
        }
        let (ticket, state) = self.begin(ViewAction::SortBy(column));
        debug!(
            target: "controller",
            "Sorting by column {} {}",
            state.sort.column,
            state.sort.direction
        );
        let outcome = self.fetch_page(&state).await;
        self.finish(ticket, outcome)
    }

    /// Jump to 1-based `page`, clamped to the pages available
    pub async fn go_to_page(&self, page: usize) -> Result<()> {
        let state = self.current_table()?;
        let page = page.clamp(1, state.num_pages());
        self.change_window(PageWindow::for_page(page, state.window.rows))
            .await
    }

    pub async fn next_page(&self) -> Result<()> {
        let state = self.current_table()?;
        self.go_to_page(state.current_page() + 1).await
    }

    pub async fn prev_page(&self) -> Result<()> {
        let state = self.current_table()?;
        self.go_to_page(state.current_page().saturating_sub(1)).await
    }

    /// Change the page size and return to the first page
    pub async fn set_page_size(&self, rows: usize) -> Result<()> {
        if rows == 0 {
            return Err(ViewerError::InvalidInput("page size must be positive".to_string()));
        }
        self.current_table()?;
        self.change_window(PageWindow::for_page(1, rows)).await
    }

    async fn change_window(&self, window: PageWindow) -> Result<()> {
        let (ticket, state) = self.begin(ViewAction::ChangePage(window));
        let outcome = self.fetch_page(&state).await;
        self.finish(ticket, outcome)
    }

    /// Rows containing `text`; the search ignores the pagination window
    pub async fn search(&self, text: &str) -> Result<()> {
        self.current_table()?;
        let (ticket, state) = self.begin(ViewAction::Search(text.trim().to_string()));
        let Some(table_id) = state.table_id.as_deref() else {
            return Err(ViewerError::InvalidInput("no table selected".to_string()));
        };

        let outcome = async {
            if !state.columns.is_empty() {
                let hits = self.service.search(table_id, &state.query).await?;
                let (rows, num_found) = hits.into_rows(state.width())?;
                return Ok(vec![ViewAction::SearchLoaded { rows, num_found }]);
            }

            debug!(target: "controller", "Loading columns of {} along with the search", table_id);
            let (columns, total, hits) = tokio::try_join!(
                self.service.get_table_columns(table_id),
                self.service.get_row_count(table_id),
                self.service.search(table_id, &state.query),
            )?;
            let (rows, num_found) = hits.into_rows(columns.len())?;
            Ok::<_, ViewerError>(vec![
                ViewAction::TableLoaded {
                    columns,
                    rows: Vec::new(),
                    num_found: total,
                },
                ViewAction::SearchLoaded { rows, num_found },
            ])
        }
        .await;

        self.finish(ticket, outcome)
    }

    /// Fetch the window of `state`
    ///
    /// Columns and count come along whenever the state has no columns yet,
    /// which is the case right after a selection or when the request that
    /// selected the table was overtaken by this one.
    async fn fetch_page(&self, state: &TableViewState) -> Result<Vec<ViewAction>> {
        let table_id = state
            .table_id
            .as_deref()
            .ok_or_else(|| ViewerError::InvalidInput("no table selected".to_string()))?;
        let sort = state.sort.to_spec();

        if !state.columns.is_empty() {
            let rows = self
                .service
                .get_rows(table_id, state.window, &sort, state.width())
                .await?;
            return Ok(vec![ViewAction::RowsLoaded(rows)]);
        }

        let (columns, docs, num_found) = tokio::try_join!(
            self.service.get_table_columns(table_id),
            self.service.get_row_documents(table_id, state.window, &sort),
            self.service.get_row_count(table_id),
        )?;
        let rows = rows_from_documents(&docs, DATA_PREFIX, columns.len())?;
        Ok(vec![ViewAction::TableLoaded {
            columns,
            rows,
            num_found,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solr::mock::MockTransport;
    use crate::solr::query::SortDirection;
    use serde_json::json;

    fn controller() -> TableViewController<MockTransport> {
        let rows = (1..=23).map(|n| vec![json!(format!("r{:02}", n)), json!(n)]).collect();
        let mock = MockTransport::new().with_table(
            "sales",
            "orders",
            &[("ref", "VARCHAR"), ("qty", "INTEGER")],
            rows,
        );
        TableViewController::new(TableService::new(mock), 10)
    }

    #[tokio::test]
    async fn test_select_table_loads_everything() {
        let controller = controller();
        controller.select_table("sales.orders").await.unwrap();
        let state = controller.state();
        assert_eq!(state.columns.len(), 2);
        assert_eq!(state.columns[1].type_tag, "INTEGER");
        assert_eq!(state.rows.len(), 10);
        assert_eq!(state.num_found, 23);
        assert_eq!(state.num_pages(), 3);
        assert!(!state.loading);

        // columns, column types, first page and count
        assert_eq!(controller.service().transport().received().len(), 4);
    }

    #[tokio::test]
    async fn test_sort_round_trip() {
        let controller = controller();
        controller.select_table("sales.orders").await.unwrap();

        controller.sort_by(2).await.unwrap();
        assert_eq!(controller.state().sort.direction, SortDirection::Asc);
        assert_eq!(controller.state().rows[0][1], json!(1));

        controller.sort_by(2).await.unwrap();
        let state = controller.state();
        assert_eq!(state.sort.direction, SortDirection::Desc);
        assert_eq!(state.rows[0][1], json!(23));
    }

    #[tokio::test]
    async fn test_sort_rejects_unknown_column() {
        let controller = controller();
        assert!(matches!(
            controller.sort_by(1).await,
            Err(ViewerError::InvalidInput(_))
        ));
        controller.select_table("sales.orders").await.unwrap();
        assert!(controller.sort_by(3).await.is_err());
        assert!(controller.sort_by(0).await.is_err());
    }

    #[tokio::test]
    async fn test_paging_is_clamped() {
        let controller = controller();
        controller.select_table("sales.orders").await.unwrap();

        controller.go_to_page(9).await.unwrap();
        let state = controller.state();
        assert_eq!(state.current_page(), 3);
        assert_eq!(state.rows.len(), 3);

        controller.next_page().await.unwrap();
        assert_eq!(controller.state().current_page(), 3);
        controller.prev_page().await.unwrap();
        assert_eq!(controller.state().current_page(), 2);

        controller.set_page_size(25).await.unwrap();
        let state = controller.state();
        assert_eq!(state.window, PageWindow::new(0, 25));
        assert_eq!(state.rows.len(), 23);
        assert!(controller.set_page_size(0).await.is_err());
    }

    #[tokio::test]
    async fn test_search_and_clear() {
        let controller = controller();
        controller.select_table("sales.orders").await.unwrap();

        controller.search("r2").await.unwrap();
        let state = controller.state();
        // r20..r23 plus r02
        assert_eq!(state.search_hits, Some(5));
        assert!(state.rows.iter().all(|row| row.len() == 2));

        let sent = controller.service().transport().received();
        assert!(sent.last().unwrap().q.ends_with("AND *r2*"));

        controller.search("").await.unwrap();
        assert_eq!(controller.state().search_hits, Some(23));
    }

    #[tokio::test]
    async fn test_failure_is_surfaced_in_state() {
        let mock = MockTransport::new().with_failure("dbpres_meta_tableId", "connection refused");
        let controller = TableViewController::new(TableService::new(mock), 10);
        let err = controller.select_table("sales.orders").await.unwrap_err();
        assert!(matches!(err, ViewerError::Transport { .. }));

        let state = controller.state();
        assert!(!state.loading);
        assert!(state.error.unwrap().contains("connection refused"));
    }
}
