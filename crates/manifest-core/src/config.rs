//! Loader configuration: which sheet is the base and what the columns are called

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Label of the base sheet in the published manifest workbook
pub const DEFAULT_BASE_SHEET: &str = "MCC Base";

/// Header labels the loader looks up in each sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub slug: String,
    pub name: String,
    pub app_id: String,
    pub depot_id: String,
    pub manifest_id: String,
    pub total_size_bytes: String,
    pub release_date_full: String,
    pub mcc_release: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            slug: "Slug".to_string(),
            name: "Name".to_string(),
            app_id: "AppID".to_string(),
            depot_id: "DepotID".to_string(),
            manifest_id: "ManifestID".to_string(),
            total_size_bytes: "TotalSizeBytes".to_string(),
            release_date_full: "ReleaseDateFull".to_string(),
            mcc_release: "MCC Release".to_string(),
        }
    }
}

/// Settings for [`crate::loader::load_with_config`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Sheet whose self-named rows become the base rows
    pub base_sheet: String,
    /// Column header labels
    pub columns: ColumnNames,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_sheet: DEFAULT_BASE_SHEET.to_string(),
            columns: ColumnNames::default(),
        }
    }
}

impl LoaderConfig {
    /// Load a config file from JSON. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
