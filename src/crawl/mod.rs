//! Crawler contract and the static HTTP implementation.
//!
//! A crawler never returns an error: failures are reported through
//! [`CrawlResult::success`] together with a message and status code, and
//! the caller decides what to do with them.

mod config;
mod http;

pub use config::{BrowserConfig, CacheMode, CrawlerRunConfig};
pub use http::{cache_path, scope_html, HttpCrawler};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::markdown::MarkdownGenerationResult;

/// Outcome of crawling one URL.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub markdown: Option<MarkdownGenerationResult>,
    /// JSON produced by the extraction strategy, if one was configured.
    pub extracted_content: Option<String>,
}

impl CrawlResult {
    pub fn failure(url: &str, status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            status_code,
            error_message: Some(message.into()),
            markdown: None,
            extracted_content: None,
        }
    }

    pub fn raw_markdown(&self) -> Option<&str> {
        self.markdown.as_ref().map(|m| m.raw_markdown.as_str())
    }

    pub fn fit_markdown(&self) -> Option<&str> {
        self.markdown.as_ref().and_then(|m| m.fit_markdown.as_deref())
    }
}

/// Fetches and renders pages.
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn crawl(&self, url: &str, config: &CrawlerRunConfig) -> CrawlResult;
}

/// Output file for a crawl: `<dir>/<host>-<YYYYmmdd-HHMMSS>.<ext>`.
pub fn output_path(dir: &Path, url: &str, at: DateTime<Utc>, extension: &str) -> PathBuf {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace('.', "_")))
        .unwrap_or_else(|| "page".to_string());
    dir.join(format!(
        "{}-{}.{}",
        host,
        at.format("%Y%m%d-%H%M%S"),
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_path() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap();
        assert_eq!(
            output_path(Path::new("out"), "https://news.ycombinator.com/jobs", at, "md"),
            PathBuf::from("out/news_ycombinator_com-20240501-130405.md")
        );
        assert_eq!(
            output_path(Path::new("out"), "not a url", at, "json"),
            PathBuf::from("out/page-20240501-130405.json")
        );
    }

    #[test]
    fn test_failure_result() {
        let result = CrawlResult::failure("https://x.test/", Some(404), "HTTP 404");
        assert!(!result.success);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.error_message.as_deref(), Some("HTTP 404"));
        assert_eq!(result.raw_markdown(), None);
    }
}
