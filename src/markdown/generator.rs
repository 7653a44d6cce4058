//! Markdown generation from cleaned page HTML.
//!
//! [`MarkdownPipeline`] is the stage the crawler calls with the cleaned page
//! content. It runs a [`MarkdownGenerator`] to get the raw markdown and then,
//! if a [`FilterChain`] is configured, stores the sanitized text as the fit
//! markdown.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::chain::{FilterChain, SanitizeError};

/// Errors from markdown generation.
#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("HTML to markdown conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

/// Output of a markdown generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkdownGenerationResult {
    /// Markdown straight from the generator.
    pub raw_markdown: String,
    /// Cleaned markdown, set by the sanitizer stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_markdown: Option<String>,
}

impl MarkdownGenerationResult {
    pub fn new(raw_markdown: impl Into<String>) -> Self {
        Self {
            raw_markdown: raw_markdown.into(),
            fit_markdown: None,
        }
    }

    /// The fit markdown if present, otherwise the raw markdown.
    pub fn best(&self) -> &str {
        self.fit_markdown.as_deref().unwrap_or(&self.raw_markdown)
    }
}

/// Turns cleaned page content into markdown.
pub trait MarkdownGenerator: Send + Sync {
    fn generate(
        &self,
        cleaned_html: &str,
        base_url: Option<&str>,
    ) -> Result<MarkdownGenerationResult, MarkdownError>;
}

/// Root-relative markdown link targets: `](/path)`.
static RELATIVE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\((/[^)\s]*)\)").unwrap());

/// HTML to markdown conversion with root-relative links resolved against
/// the page URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMarkdownGenerator;

impl MarkdownGenerator for DefaultMarkdownGenerator {
    fn generate(
        &self,
        cleaned_html: &str,
        base_url: Option<&str>,
    ) -> Result<MarkdownGenerationResult, MarkdownError> {
        let markdown =
            htmd::convert(cleaned_html).map_err(|e| MarkdownError::Conversion(e.to_string()))?;

        let markdown = match base_url.and_then(|u| Url::parse(u).ok()) {
            Some(base) => absolutize_links(&markdown, &base),
            None => markdown,
        };

        Ok(MarkdownGenerationResult::new(markdown))
    }
}

fn absolutize_links(markdown: &str, base: &Url) -> String {
    RELATIVE_LINK
        .replace_all(markdown, |caps: &Captures| match base.join(&caps[1]) {
            Ok(url) => format!("]({})", url),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

/// Generator followed by an optional sanitizer stage.
pub struct MarkdownPipeline {
    generator: Box<dyn MarkdownGenerator>,
    sanitizer: Option<FilterChain>,
}

impl MarkdownPipeline {
    /// Pipeline without a sanitizer; fit markdown stays unset.
    pub fn new(generator: impl MarkdownGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
            sanitizer: None,
        }
    }

    /// Default generator followed by the Google Maps cleanup chain.
    pub fn google_maps() -> Self {
        Self::new(DefaultMarkdownGenerator).with_sanitizer(FilterChain::google_maps())
    }

    pub fn with_sanitizer(mut self, chain: FilterChain) -> Self {
        self.sanitizer = Some(chain);
        self
    }

    pub fn sanitizer(&self) -> Option<&FilterChain> {
        self.sanitizer.as_ref()
    }

    /// Generate markdown, then overwrite the fit markdown with the
    /// sanitized raw markdown.
    pub fn process(
        &self,
        cleaned_html: &str,
        base_url: Option<&str>,
    ) -> Result<MarkdownGenerationResult, MarkdownError> {
        let mut result = self.generator.generate(cleaned_html, base_url)?;
        if let Some(chain) = &self.sanitizer {
            result.fit_markdown = Some(chain.run(&result.raw_markdown)?);
        }
        Ok(result)
    }
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new(DefaultMarkdownGenerator)
    }
}

impl fmt::Debug for MarkdownPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownPipeline")
            .field("sanitizer", &self.sanitizer)
            .finish_non_exhaustive()
    }
}
