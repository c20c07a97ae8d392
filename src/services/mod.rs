pub mod discovery;
pub mod table_service;
pub mod table_view_controller;

pub use discovery::{discover_catalog, Discovery, DiscoveryOptions};
pub use table_service::{SearchHits, TableService};
pub use table_view_controller::TableViewController;
