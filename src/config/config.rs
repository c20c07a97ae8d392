use crate::error::{Result, ViewerError};
use crate::services::DiscoveryOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub display: DisplayConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the search service, without the collection
    pub base_url: String,

    /// Collection (core) holding the preserved database
    pub collection: String,

    /// Per-request timeout in seconds; 0 waits indefinitely
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Page sizes offered for the table view
    pub page_sizes: Vec<usize>,

    /// Page size used when a table is first shown
    pub default_page_size: usize,

    /// Cells longer than this are truncated when rendering
    pub max_cell_width: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Fetch column names and types of every table at startup
    pub load_column_metadata: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8983/solrService".to_string(),
            collection: "collection1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_sizes: vec![10, 25, 50, 100],
            default_page_size: 10,
            max_cell_width: 40,
        }
    }
}

fn config_error(err: impl std::fmt::Display) -> ViewerError {
    ViewerError::Config(err.to_string())
}

impl Config {
    /// Load config from the default location, writing defaults when missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(config_error)?;
        let config: Config = toml::from_str(&contents).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(config_error)?;
        }
        let contents = toml::to_string_pretty(self).map_err(config_error)?;
        fs::write(path, contents).map_err(config_error)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| config_error("Could not determine config directory"))?;

        Ok(config_dir.join("dbpres-viewer").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(config_error("backend.base_url is empty"));
        }
        if self.backend.collection.trim().is_empty() {
            return Err(config_error("backend.collection is empty"));
        }
        if self.display.default_page_size == 0 {
            return Err(config_error("display.default_page_size must be positive"));
        }
        if !self.display.page_sizes.is_empty()
            && !self
                .display
                .page_sizes
                .contains(&self.display.default_page_size)
        {
            return Err(config_error(format!(
                "display.default_page_size {} is not one of {:?}",
                self.display.default_page_size, self.display.page_sizes
            )));
        }
        Ok(())
    }

    /// Full select endpoint, `<base_url>/<collection>/select`
    pub fn select_url(&self) -> String {
        format!(
            "{}/{}/select",
            self.backend.base_url.trim_end_matches('/'),
            self.backend.collection.trim_matches('/')
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.backend.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            load_column_metadata: self.discovery.load_column_metadata,
        }
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# dbpres-viewer configuration
# Location: ~/.config/dbpres-viewer/config.toml (Linux)
#           ~/Library/Application Support/dbpres-viewer/config.toml (macOS)
#           %APPDATA%\dbpres-viewer\config.toml (Windows)

[backend]
# Search service holding the preserved database
base_url = "http://localhost:8983/solrService"
collection = "collection1"

# Seconds to wait for a response (0 waits indefinitely)
timeout_secs = 30

[display]
# Page sizes offered by \rows
page_sizes = [10, 25, 50, 100]

# Page size when a table is first shown (must be one of page_sizes)
default_page_size = 10

# Truncate longer cells when rendering
max_cell_width = 40

[discovery]
# Fetch column names and types of every table at startup
load_column_metadata = false
"#
        .to_string()
    }
}
