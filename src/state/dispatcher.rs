//! View dispatcher with request generations
//!
//! Each user intent bumps the generation and hands out a ticket. Outcomes are
//! only applied while their ticket is still the latest, so a slow response to
//! an old request can never overwrite the state of a newer one.

use super::events::ViewAction;
use super::view_state::{reduce, TableViewState};
use crate::error::{Result, ViewerError};
use tracing::debug;

/// Identifies the request started by one user intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub generation: u64,
    pub action: &'static str,
    pub applied: bool,
}

pub struct ViewDispatcher {
    state: TableViewState,
    generation: u64,

    /// Recent actions for debugging
    event_history: Vec<DispatchRecord>,

    max_history: usize,
}

impl Default for ViewDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewDispatcher {
    pub fn new() -> Self {
        Self {
            state: TableViewState::default(),
            generation: 0,
            event_history: Vec::new(),
            max_history: 100,
        }
    }

    pub fn state(&self) -> &TableViewState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a user intent and start a new request generation
    pub fn begin(&mut self, intent: ViewAction) -> RequestTicket {
        debug_assert!(intent.is_intent(), "{} does not start a request", intent.name());
        self.generation += 1;
        debug!(
            target: "state",
            "Request #{} started by {}",
            self.generation,
            intent.name()
        );
        self.record(intent.name(), true);
        self.state = reduce(&self.state, intent);
        RequestTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply the outcome of the request identified by `ticket`
    pub fn complete(&mut self, ticket: RequestTicket, outcome: ViewAction) -> Result<()> {
        if !self.is_current(ticket) {
            debug!(
                target: "state",
                "Dropping {} for request #{} (current is #{})",
                outcome.name(),
                ticket.generation,
                self.generation
            );
            self.record(outcome.name(), false);
            return Err(ViewerError::Superseded {
                generation: ticket.generation,
            });
        }
        self.record(outcome.name(), true);
        self.state = reduce(&self.state, outcome);
        Ok(())
    }

    pub fn get_event_history(&self) -> &[DispatchRecord] {
        &self.event_history
    }

    fn record(&mut self, action: &'static str, applied: bool) {
        self.event_history.push(DispatchRecord {
            generation: self.generation,
            action,
            applied,
        });
        if self.event_history.len() > self.max_history {
            self.event_history.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(id: &str) -> ViewAction {
        ViewAction::SelectTable {
            table_id: id.to_string(),
            page_size: 10,
        }
    }

    fn loaded(count: u64) -> ViewAction {
        ViewAction::TableLoaded {
            columns: vec![],
            rows: vec![],
            num_found: count,
        }
    }

    #[test]
    fn test_latest_request_wins_regardless_of_arrival() {
        let mut dispatcher = ViewDispatcher::new();
        let first = dispatcher.begin(select("sales.orders"));
        let second = dispatcher.begin(select("hr.employees"));

        dispatcher.complete(second, loaded(2)).unwrap();
        let late = dispatcher.complete(first, loaded(1));

        assert!(matches!(late, Err(ViewerError::Superseded { generation: 1 })));
        assert_eq!(dispatcher.state().table_id.as_deref(), Some("hr.employees"));
        assert_eq!(dispatcher.state().num_found, 2);
    }

    #[test]
    fn test_history_records_dropped_outcomes() {
        let mut dispatcher = ViewDispatcher::new();
        let stale = dispatcher.begin(select("a.b"));
        dispatcher.begin(ViewAction::SortBy(1));
        let _ = dispatcher.complete(stale, loaded(0));

        let history = dispatcher.get_event_history();
        assert_eq!(history.len(), 3);
        assert!(!history[2].applied);
        assert_eq!(history[2].action, "TableLoaded");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not start a request")]
    fn test_begin_rejects_completions() {
        ViewDispatcher::new().begin(loaded(3));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut dispatcher = ViewDispatcher::new();
        for _ in 0..150 {
            dispatcher.begin(ViewAction::SortBy(1));
        }
        assert_eq!(dispatcher.get_event_history().len(), 100);
        assert_eq!(dispatcher.generation(), 150);
    }
}
