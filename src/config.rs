use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::env;

pub const DEFAULT_MANIFEST_URL: &str = "https://parussoft.com/app_infos/AllApps.json";
pub const DEFAULT_DETAIL_BASE_URL: &str = "https://parussoft.com/app_infos/jsons/";
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub manifest_url: String,
    pub detail_base_url: String,
    /// Overrides the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub max_concurrent_fetches: usize,
    pub request_timeout_secs: u64,
    /// Delete cached detail files of apps the remote manifest no longer lists.
    pub prune_stale: bool,
    pub follow_url: String,
    pub coffee_url: String,
    pub report_email: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_owned(),
            detail_base_url: DEFAULT_DETAIL_BASE_URL.to_owned(),
            cache_dir: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            prune_stale: false,
            follow_url: "https://twitter.com/owenzhao".to_owned(),
            coffee_url: "https://buymeacoffee.com/owenzhao".to_owned(),
            report_email: "support@parussoft.com".to_owned(),
        }
    }
}

impl PanelConfig {
    /// Load the config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from_path(&env::config_path())
    }

    pub fn load_from_path(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("config: {} not read ({err}); using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(config) => config.sanitized(),
            Err(err) => {
                warn!(
                    "config: failed to parse {} ({err}); using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(env::default_cache_dir)
    }

    fn sanitized(mut self) -> Self {
        if self.max_concurrent_fetches == 0 {
            self.max_concurrent_fetches = 1;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        self
    }
}
