use repolens_api::{RetryConfig, GITHUB_REPOS_URL, GITHUB_SEARCH_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{OrderBy, QueryParams, SortBy};
use crate::pagination::{Pagination, DEFAULT_PER_PAGE, DEFAULT_RESULT_CAP, MAX_PER_PAGE};
use crate::search_controller::ControllerSettings;

/// Main configuration structure
///
/// Loaded from the config file; the CLI overrides individual fields.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub search: SearchConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load config from default location, defaults if there is no file
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            crate::Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config dir>/repolens/config.toml` (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?;
        Ok(config_dir.join("repolens").join("config.toml"))
    }

    /// `search.per_page` clamped to what the API will actually serve
    pub fn per_page(&self) -> u32 {
        self.search.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.per_page(), self.search.result_cap)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            debounce: Duration::from_millis(self.search.debounce_ms),
            per_page: self.per_page(),
        }
    }

    /// Form state before the user has typed anything
    pub fn initial_params(&self) -> QueryParams {
        let (created_from, created_to) = QueryParams::default_range(self.search.range_months);
        QueryParams {
            search_term: String::new(),
            created_from,
            created_to,
            sort_by: self.search.sort_by,
            order_by: self.search.order_by,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubConfig {
    /// Personal access token; raises the search rate limit
    pub token: Option<String>,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Base for `/{owner}/{repo}/readme`
    #[serde(default = "default_repos_url")]
    pub repos_url: String,
}

fn default_search_url() -> String {
    GITHUB_SEARCH_URL.to_string()
}

fn default_repos_url() -> String {
    GITHUB_REPOS_URL.to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            search_url: default_search_url(),
            repos_url: default_repos_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Highest result index the search API will serve
    #[serde(default = "default_result_cap")]
    pub result_cap: u64,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub order_by: OrderBy,

    /// Length of the default created-date range
    #[serde(default = "default_range_months")]
    pub range_months: u32,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_result_cap() -> u64 {
    DEFAULT_RESULT_CAP
}

fn default_range_months() -> u32 {
    1
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            per_page: default_per_page(),
            result_cap: default_result_cap(),
            sort_by: SortBy::default(),
            order_by: OrderBy::default(),
            range_months: default_range_months(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// Extra attempts for 5xx / 429 / connect failures; 0 disables retrying
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

impl HttpConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            ..RetryConfig::default()
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
