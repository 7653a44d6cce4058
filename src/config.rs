//! Configuration management for listscrape.
//!
//! Settings are resolved in layers: built-in defaults, then the data
//! directory (CLI flag or `LISTSCRAPE_DATA_DIR`), then the TOML config file,
//! then the remaining `LISTSCRAPE_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::crawl::BrowserConfig;
use crate::http_client::build_client;
use crate::proxy::{
    FilePoolStore, HtmlTableSource, PlainTextSource, ProxyRotator, ProxySource,
    FREE_PROXY_LIST_COLUMNS, FREE_PROXY_LIST_SELECTOR, FREE_PROXY_LIST_URL, SPYS_ME_URL,
};

/// Config file looked up inside the data directory.
pub const CONFIG_FILENAME: &str = "listscrape.toml";
pub const PROXY_STORE_SUBDIR: &str = "proxy_store";
pub const OUTPUT_SUBDIR: &str = "output";
pub const CACHE_SUBDIR: &str = "cache";

pub const ENV_DATA_DIR: &str = "LISTSCRAPE_DATA_DIR";
pub const ENV_PROXY_DIR: &str = "LISTSCRAPE_PROXY_DIR";
pub const ENV_OUTPUT_DIR: &str = "LISTSCRAPE_OUTPUT_DIR";
pub const ENV_USER_AGENT: &str = "LISTSCRAPE_USER_AGENT";

/// Where the proxy rotator scrapes candidates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySourcesConfig {
    /// Plain-text listing with `ip:port` tokens.
    pub plain_text_url: String,
    /// HTML table listing.
    pub html_table_url: String,
    /// Selector for the table cells.
    pub html_table_selector: String,
    /// Cells per table row.
    pub html_table_columns: usize,
}

impl Default for ProxySourcesConfig {
    fn default() -> Self {
        Self {
            plain_text_url: SPYS_ME_URL.to_string(),
            html_table_url: FREE_PROXY_LIST_URL.to_string(),
            html_table_selector: FREE_PROXY_LIST_SELECTOR.to_string(),
            html_table_columns: FREE_PROXY_LIST_COLUMNS,
        }
    }
}

impl ProxySourcesConfig {
    /// Sources in refresh order: plain text first, then the HTML table.
    pub fn sources(&self) -> Vec<Box<dyn ProxySource>> {
        vec![
            Box::new(PlainTextSource::new(&self.plain_text_url)),
            Box::new(HtmlTableSource::new(
                &self.html_table_url,
                &self.html_table_selector,
                self.html_table_columns,
            )),
        ]
    }
}

/// Contents of `listscrape.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub proxy_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: Option<u64>,
    pub headless: Option<bool>,
    pub proxy_sources: Option<ProxySourcesConfig>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory holding the proxy pool files.
    pub proxy_dir: PathBuf,
    /// Directory crawl output is written to.
    pub output_dir: PathBuf,
    /// Page cache directory.
    pub cache_dir: PathBuf,
    /// User agent: `None` for the default, "impersonate", or a literal.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    pub headless: bool,
    pub proxy_sources: ProxySourcesConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("listscrape");
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Defaults with every derived directory rooted at `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            proxy_dir: data_dir.join(PROXY_STORE_SUBDIR),
            output_dir: data_dir.join(OUTPUT_SUBDIR),
            cache_dir: data_dir.join(CACHE_SUBDIR),
            data_dir,
            user_agent: None,
            request_timeout: 30,
            headless: true,
            proxy_sources: ProxySourcesConfig::default(),
        }
    }

    /// Overlay values from a config file.
    pub fn apply_config(&mut self, config: Config) {
        if let Some(data_dir) = config.data_dir {
            let rebased = Self::with_data_dir(data_dir);
            self.proxy_dir = rebased.proxy_dir;
            self.output_dir = rebased.output_dir;
            self.cache_dir = rebased.cache_dir;
            self.data_dir = rebased.data_dir;
        }
        if let Some(dir) = config.proxy_dir {
            self.proxy_dir = dir;
        }
        if let Some(dir) = config.output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = config.cache_dir {
            self.cache_dir = dir;
        }
        if config.user_agent.is_some() {
            self.user_agent = config.user_agent;
        }
        if let Some(timeout) = config.request_timeout {
            self.request_timeout = timeout;
        }
        if let Some(headless) = config.headless {
            self.headless = headless;
        }
        if let Some(sources) = config.proxy_sources {
            self.proxy_sources = sources;
        }
    }

    /// Overlay `LISTSCRAPE_*` variables (other than the data dir).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_PROXY_DIR) {
            self.proxy_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(ua) = lookup(ENV_USER_AGENT) {
            self.user_agent = Some(ua);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn http_client(&self) -> reqwest::Result<Client> {
        build_client(self.user_agent.as_deref(), self.timeout(), None)
    }

    pub fn proxy_store(&self) -> FilePoolStore {
        FilePoolStore::new(&self.proxy_dir)
    }

    pub fn proxy_rotator(&self) -> reqwest::Result<ProxyRotator<FilePoolStore>> {
        Ok(ProxyRotator::with_sources(
            self.proxy_store(),
            self.http_client()?,
            self.proxy_sources.sources(),
        ))
    }

    /// Browser config seeded from these settings.
    pub fn browser_config(&self, proxy: Option<String>) -> BrowserConfig {
        BrowserConfig {
            headless: self.headless,
            proxy,
            user_agent: self.user_agent.clone(),
            timeout: self.request_timeout,
            verbose: false,
        }
    }
}

/// Resolve settings from defaults, data dir, config file, and environment.
///
/// An explicit `config_path` must exist; the implicit
/// `<data_dir>/listscrape.toml` is optional.
pub fn load_settings(
    data_dir: Option<PathBuf>,
    config_path: Option<&Path>,
) -> anyhow::Result<Settings> {
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

    let mut settings = match data_dir.or_else(|| env(ENV_DATA_DIR).map(PathBuf::from)) {
        Some(dir) => Settings::with_data_dir(dir),
        None => Settings::default(),
    };

    let config = match config_path {
        Some(path) => Some(Config::load(path)?),
        None => {
            let implicit = settings.data_dir.join(CONFIG_FILENAME);
            if implicit.is_file() {
                Some(Config::load(&implicit)?)
            } else {
                None
            }
        }
    };
    if let Some(config) = config {
        settings.apply_config(config);
    }

    settings.apply_env(env);
    Ok(settings)
}
