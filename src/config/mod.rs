//! Configuration module
//!
//! Backend endpoint, display and discovery settings loaded from TOML.

pub mod config;

pub use config::Config;
