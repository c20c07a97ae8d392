use crate::error::{Result, ViewerError};
use std::fs;
use std::path::PathBuf;

pub struct AppPaths;

impl AppPaths {
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ViewerError::Config("Cannot determine data directory".to_string()))?
            .join("dbpres-viewer");

        fs::create_dir_all(&data_dir).map_err(|e| ViewerError::Config(e.to_string()))?;
        Ok(data_dir)
    }

    /// Command history of the interactive shell
    pub fn history_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("history.txt"))
    }
}
