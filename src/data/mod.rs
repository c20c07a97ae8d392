//! Data model of the preserved database

pub mod catalog;

pub use catalog::{Catalog, Column, Row, Schema, Table};
