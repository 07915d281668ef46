use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding one file per entity set.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Where report files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_sap_client")]
    pub sap_client: String,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_sap_client() -> String {
    "300".to_string()
}

fn default_preview_rows() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            sap_client: default_sap_client(),
            preview_rows: default_preview_rows(),
        }
    }
}

/// Settings from a JSON file, or the defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| ReportError::Settings(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ReportError::Settings(format!("{}: {e}", path.display())))
}
