use std::path::{Path, PathBuf};
use std::time::Duration;

use cwf_help_types::HelpModule;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::history::DEFAULT_MAX_SIZE;
use crate::search::DEFAULT_MAX_RESULTS;
use crate::viewer::ViewerMode;

/// Page that hosts the popup help viewer.
pub const DEFAULT_VIEWER_URL: &str = "/web/org/carewebframework/help/helpViewer.cwf";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpConfig {
    #[serde(default)]
    pub viewer_mode: ViewerMode,

    #[serde(default = "default_viewer_url")]
    pub viewer_url: String,

    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Keep-alive interval of request queues; `null` disables the check.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_timeout_ms: Option<u64>,

    /// Directory that web paths (`/web/...`) resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_root: Option<PathBuf>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub modules: Vec<HelpModule>,
}

fn default_viewer_url() -> String {
    DEFAULT_VIEWER_URL.to_string()
}

fn default_history_size() -> usize {
    DEFAULT_MAX_SIZE
}

#[allow(clippy::unnecessary_wraps)] // serde default for an optional field
fn default_keep_alive() -> Option<u64> {
    Some(10_000)
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            viewer_mode: ViewerMode::default(),
            viewer_url: default_viewer_url(),
            history_size: default_history_size(),
            keep_alive_timeout_ms: default_keep_alive(),
            content_root: None,
            search: SearchConfig::default(),
            modules: Vec::new(),
        }
    }
}

impl HelpConfig {
    /// Load config from file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    #[must_use]
    pub fn keep_alive(&self) -> Option<Duration> {
        self.keep_alive_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Where the search index is stored; in memory only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_directory: Option<PathBuf>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            index_directory: None,
            max_results: default_max_results(),
        }
    }
}
