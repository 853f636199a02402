//! `AppConfig` struct, TOML read/write and resolution.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

/// Shown in place of secrets by `config show`.
const MASK: &str = "********";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Metadata API settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Document store settings.
    #[serde(default)]
    pub appwrite: AppwriteConfig,
    /// Search-count backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Search behaviour.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[tmdb]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// API base URL; the client default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Response language, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Sub-resources appended to detail requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append_to_response: Option<String>,
}

/// `[appwrite]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppwriteConfig {
    /// API endpoint including the `/v1` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Project ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Database ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    /// Collection ID holding search counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    /// Server API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Where search counts are kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Appwrite collection.
    #[default]
    Appwrite,
    /// Local SQLite database.
    Sqlite,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StoreBackend,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before searching.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Number of trending terms shown.
    #[serde(default = "default_trending_limit")]
    pub trending_limit: u32,
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_trending_limit() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            trending_limit: default_trending_limit(),
        }
    }
}

/// Resolved Appwrite connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAppwrite {
    /// API endpoint.
    pub endpoint: Url,
    /// Project ID.
    pub project_id: String,
    /// Database ID.
    pub database_id: String,
    /// Collection ID.
    pub collection_id: String,
    /// Server API key.
    pub api_key: String,
}

/// Resolved search-count backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStore {
    /// Remote collection.
    Appwrite(ResolvedAppwrite),
    /// Local database under the data directory.
    Sqlite,
}

/// Configuration with every required value present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Metadata API base URL override.
    pub tmdb_base_url: Option<Url>,
    /// Metadata API bearer token.
    pub tmdb_api_token: String,
    /// Response language override.
    pub tmdb_language: Option<String>,
    /// Detail sub-resources override.
    pub tmdb_append_to_response: Option<String>,
    /// Search-count backend.
    pub store: ResolvedStore,
    /// Debounce delay.
    pub debounce: Duration,
    /// Number of trending terms shown.
    pub trending_limit: u32,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Starter file written by `config init`, with placeholder credentials.
    #[must_use]
    pub fn template() -> Self {
        Self {
            tmdb: TmdbConfig {
                base_url: Some(String::from("https://api.themoviedb.org/3/")),
                api_token: Some(String::new()),
                language: Some(String::from("en-US")),
                append_to_response: Some(String::from("videos,credits")),
            },
            appwrite: AppwriteConfig {
                endpoint: Some(String::from("https://cloud.appwrite.io/v1")),
                project_id: Some(String::new()),
                database_id: Some(String::new()),
                collection_id: Some(String::new()),
                api_key: Some(String::new()),
            },
            store: StoreConfig::default(),
            search: SearchConfig::default(),
        }
    }

    /// Overrides file values with environment variables looked up via `var`.
    ///
    /// Empty variables are ignored.
    #[must_use]
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let overrides: [(&str, &mut Option<String>); 7] = [
            ("TMDB_API_TOKEN", &mut self.tmdb.api_token),
            ("TMDB_BASE_URL", &mut self.tmdb.base_url),
            ("APPWRITE_ENDPOINT", &mut self.appwrite.endpoint),
            ("APPWRITE_PROJECT_ID", &mut self.appwrite.project_id),
            ("APPWRITE_DATABASE_ID", &mut self.appwrite.database_id),
            ("APPWRITE_COLLECTION_ID", &mut self.appwrite.collection_id),
            ("APPWRITE_API_KEY", &mut self.appwrite.api_key),
        ];
        for (name, slot) in overrides {
            if let Some(value) = lookup(name) {
                *slot = Some(value);
            }
        }
        self
    }

    /// Copy with every credential replaced by a mask.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mask = |v: &Option<String>| {
            v.as_ref()
                .map(|s| if s.is_empty() { String::new() } else { String::from(MASK) })
        };
        let mut masked = self.clone();
        masked.tmdb.api_token = mask(&self.tmdb.api_token);
        masked.appwrite.api_key = mask(&self.appwrite.api_key);
        masked
    }

    /// Checks every required value and parses URLs.
    ///
    /// Appwrite settings are only required for the `appwrite` backend.
    ///
    /// # Errors
    ///
    /// Returns an error listing every missing key, or naming a malformed URL.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let mut missing = Vec::new();
        let mut require = |key: &'static str, value: &Option<String>| {
            let present = value.as_deref().map(str::trim).filter(|v| !v.is_empty());
            if present.is_none() {
                missing.push(key);
            }
            present.map(String::from)
        };

        let tmdb_api_token = require("tmdb.api_token", &self.tmdb.api_token);
        let appwrite = match self.store.backend {
            StoreBackend::Appwrite => Some((
                require("appwrite.endpoint", &self.appwrite.endpoint),
                require("appwrite.project_id", &self.appwrite.project_id),
                require("appwrite.database_id", &self.appwrite.database_id),
                require("appwrite.collection_id", &self.appwrite.collection_id),
                require("appwrite.api_key", &self.appwrite.api_key),
            )),
            StoreBackend::Sqlite => None,
        };

        if !missing.is_empty() {
            bail!("missing required configuration: {}", missing.join(", "));
        }

        let store = match appwrite {
            Some((
                Some(endpoint),
                Some(project_id),
                Some(database_id),
                Some(collection_id),
                Some(api_key),
            )) => ResolvedStore::Appwrite(ResolvedAppwrite {
                endpoint: parse_url("appwrite.endpoint", &endpoint)?,
                project_id,
                database_id,
                collection_id,
                api_key,
            }),
            Some(_) => bail!("missing required configuration: appwrite"),
            None => ResolvedStore::Sqlite,
        };

        let tmdb_base_url = self
            .tmdb
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| parse_url("tmdb.base_url", v))
            .transpose()?;

        Ok(ResolvedConfig {
            tmdb_base_url,
            tmdb_api_token: tmdb_api_token.unwrap_or_default(),
            tmdb_language: non_blank(self.tmdb.language.as_deref()),
            tmdb_append_to_response: non_blank(self.tmdb.append_to_response.as_deref()),
            store,
            debounce: Duration::from_millis(self.search.debounce_ms),
            trending_limit: self.search.trending_limit,
        })
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("invalid URL for {key}: {value}"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}
