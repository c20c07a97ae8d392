//! Browser for relational tables preserved as documents in a search index

pub mod config;
pub mod data;
pub mod error;
pub mod services;
pub mod solr;
pub mod state;
pub mod utils;

pub use error::{Result, ViewerError};
