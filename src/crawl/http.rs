//! Static HTTP crawler.
//!
//! Fetches the page with reqwest and runs the markdown stage on the served
//! HTML. No browser is involved, so `wait_for` and `js_code` have no effect;
//! pages that render client-side need a browser-backed [`Crawler`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{BrowserConfig, CacheMode, CrawlerRunConfig};
use super::{CrawlResult, Crawler};
use crate::http_client::build_client;

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cache I/O error: {0}")]
    Cache(#[from] std::io::Error),
}

/// Crawler that fetches server-rendered HTML directly.
#[derive(Debug, Clone)]
pub struct HttpCrawler {
    client: Client,
    cache_dir: Option<PathBuf>,
    verbose: bool,
}

impl HttpCrawler {
    pub fn new(browser: &BrowserConfig) -> reqwest::Result<Self> {
        let client = build_client(
            browser.user_agent.as_deref(),
            Duration::from_secs(browser.timeout),
            browser.proxy.as_deref(),
        )?;
        if let Some(proxy) = &browser.proxy {
            info!(proxy = %proxy, "Crawling through proxy");
        }
        Ok(Self {
            client,
            cache_dir: None,
            verbose: browser.verbose,
        })
    }

    /// Store fetched pages under `dir` for [`CacheMode::Enabled`] runs.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| cache_path(dir, url))
    }

    /// Returns the status code and body, from cache when allowed.
    async fn fetch(&self, url: &str, mode: CacheMode) -> Result<(u16, String), FetchError> {
        let cache_path = self.cache_path(url);

        if mode.reads() {
            if let Some(path) = &cache_path {
                match tokio::fs::read_to_string(path).await {
                    Ok(body) => {
                        debug!(url, "Serving page from cache");
                        return Ok((200, body));
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if mode.writes() && (200..300).contains(&status) {
            if let Some(path) = &cache_path {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, &body).await?;
            }
        }

        Ok((status, body))
    }
}

#[async_trait]
impl Crawler for HttpCrawler {
    async fn crawl(&self, url: &str, config: &CrawlerRunConfig) -> CrawlResult {
        if config.wait_for.is_some() || !config.js_code.is_empty() {
            warn!(url, "wait_for and js_code need a browser; ignoring them");
        }

        let (status, html) = match self.fetch(url, config.cache_mode).await {
            Ok(page) => page,
            Err(e) => return CrawlResult::failure(url, None, e.to_string()),
        };

        if !(200..300).contains(&status) {
            return CrawlResult::failure(url, Some(status), format!("HTTP {}", status));
        }

        let scoped = match scope_html(&html, config.css_selector.as_deref()) {
            Ok(scoped) => scoped,
            Err(message) => return CrawlResult::failure(url, Some(status), message),
        };

        let markdown = match config.markdown.process(&scoped, Some(url)) {
            Ok(markdown) => markdown,
            Err(e) => return CrawlResult::failure(url, Some(status), e.to_string()),
        };

        let extracted_content = match &config.extraction {
            Some(strategy) => match strategy.extract(url, markdown.best()).await {
                Ok(value) => Some(value.to_string()),
                Err(e) => return CrawlResult::failure(url, Some(status), e.to_string()),
            },
            None => None,
        };

        if self.verbose {
            info!(url, status, bytes = html.len(), "Crawled page");
        }

        CrawlResult {
            url: url.to_string(),
            success: true,
            status_code: Some(status),
            error_message: None,
            markdown: Some(markdown),
            extracted_content,
        }
    }
}

/// Cache file for a URL: `<dir>/<blake3 of url>.html`.
pub fn cache_path(dir: &Path, url: &str) -> PathBuf {
    let hash = blake3::hash(url.as_bytes());
    dir.join(format!("{}.html", hash.to_hex()))
}

/// Keep only the elements matching `selector`, joined in document order.
pub fn scope_html(html: &str, selector: Option<&str>) -> Result<String, String> {
    let Some(selector) = selector else {
        return Ok(html.to_string());
    };

    let parsed = Selector::parse(selector)
        .map_err(|e| format!("invalid CSS selector '{}': {}", selector, e))?;
    let document = Html::parse_document(html);

    let parts: Vec<String> = document.select(&parsed).map(|el| el.html()).collect();
    if parts.is_empty() {
        warn!(selector, "CSS selector matched nothing");
    }
    Ok(parts.join("\n"))
}
