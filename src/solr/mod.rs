//! Search backend access
//!
//! Query building, the HTTP transport and typed response decoding.

pub mod fields;
pub mod mock;
pub mod query;
pub mod response;
pub mod transport;

pub use query::{PageWindow, SolrQuery, SortDirection, SortSpec};
pub use response::{Document, SolrResponse};
pub use transport::{HttpTransport, SolrTransport};
