//! Table view state management
//!
//! `view_state` holds the state value and its reducer, `events` the actions
//! that drive it, and `dispatcher` applies them with request generations.

pub mod dispatcher;
pub mod events;
pub mod view_state;

pub use dispatcher::{RequestTicket, ViewDispatcher};
pub use events::ViewAction;
pub use view_state::{reduce, ColumnSort, TableViewState, DEFAULT_PAGE_SIZE};
