//! Browser and per-run crawl configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::extract::ExtractionStrategy;
use crate::markdown::MarkdownPipeline;

/// Browser-level settings shared by every crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window. Ignored by the static HTTP crawler.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy URL (e.g. "http://1.2.3.4:8080" or "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// User agent: unset for the default, "impersonate", or a literal string.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Log each crawl at info level.
    #[serde(default)]
    pub verbose: bool,
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            proxy: None,
            user_agent: None,
            timeout: default_timeout(),
            verbose: false,
        }
    }
}

/// Page cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Serve from cache when present, store fresh fetches.
    Enabled,
    /// Always fetch and leave the cache untouched for this run.
    #[default]
    Bypass,
    /// Always fetch and store the result for later `Enabled` runs.
    WriteOnly,
    /// Never read or write the cache.
    Disabled,
}

impl CacheMode {
    pub fn reads(&self) -> bool {
        matches!(self, CacheMode::Enabled)
    }

    pub fn writes(&self) -> bool {
        matches!(self, CacheMode::Enabled | CacheMode::WriteOnly)
    }
}

/// Settings for a single crawl.
#[derive(Clone)]
pub struct CrawlerRunConfig {
    pub cache_mode: CacheMode,
    /// CSS selector to wait for before capturing the page.
    pub wait_for: Option<String>,
    /// Scripts to run in the page before capture (scrolling, clicking).
    pub js_code: Vec<String>,
    /// Restrict markdown generation to elements matching this selector.
    pub css_selector: Option<String>,
    /// Markdown generation stage, including the optional sanitizer.
    pub markdown: Arc<MarkdownPipeline>,
    /// Structured extraction run on the best available markdown.
    pub extraction: Option<Arc<dyn ExtractionStrategy>>,
}

impl Default for CrawlerRunConfig {
    fn default() -> Self {
        Self {
            cache_mode: CacheMode::default(),
            wait_for: None,
            js_code: Vec::new(),
            css_selector: None,
            markdown: Arc::new(MarkdownPipeline::default()),
            extraction: None,
        }
    }
}

impl CrawlerRunConfig {
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    pub fn with_css_selector(mut self, selector: impl Into<String>) -> Self {
        self.css_selector = Some(selector.into());
        self
    }

    pub fn with_wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_for = Some(selector.into());
        self
    }

    pub fn with_js_code(mut self, script: impl Into<String>) -> Self {
        self.js_code.push(script.into());
        self
    }

    pub fn with_markdown(mut self, pipeline: MarkdownPipeline) -> Self {
        self.markdown = Arc::new(pipeline);
        self
    }

    pub fn with_extraction(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.extraction = Some(strategy);
        self
    }
}

impl fmt::Debug for CrawlerRunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerRunConfig")
            .field("cache_mode", &self.cache_mode)
            .field("wait_for", &self.wait_for)
            .field("js_code", &self.js_code.len())
            .field("css_selector", &self.css_selector)
            .field("markdown", &self.markdown)
            .field("extraction", &self.extraction.is_some())
            .finish()
    }
}
