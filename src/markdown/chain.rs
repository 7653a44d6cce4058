//! Ordered filter chain with per-step error reporting.

use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;
use tracing::{debug, error};

use super::filters::{remove_redundant_data, remove_special_characters, transform_website_links};

/// Error raised by a single filter step.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0}")]
    Failed(String),
}

/// A filter step failed and the chain was aborted.
#[derive(Debug, Error)]
#[error("markdown filter '{step}' failed: {source}")]
pub struct SanitizeError {
    /// Description of the step that failed.
    pub step: String,
    #[source]
    pub source: FilterError,
}

type FilterFn = Box<dyn Fn(&str) -> Result<String, FilterError> + Send + Sync>;

/// A named transformation in a [`FilterChain`].
pub struct FilterStep {
    description: String,
    apply: FilterFn,
}

impl FilterStep {
    pub fn new<F>(description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&str) -> Result<String, FilterError> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            apply: Box::new(apply),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn apply(&self, input: &str) -> Result<String, FilterError> {
        (self.apply)(input)
    }
}

impl fmt::Debug for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStep")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered list of filter steps. Insertion order is application order;
/// each step receives the output of the one before it.
#[derive(Debug, Default)]
pub struct FilterChain {
    steps: Vec<FilterStep>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cleanup chain for Google Maps business listings.
    ///
    /// Order matters: website links are rewritten before anything else
    /// touches them, and status lines are reduced to their phone numbers
    /// before special characters are stripped.
    pub fn google_maps() -> Self {
        Self::new()
            .with_step("Transform website link format", |s| {
                Ok(transform_website_links(s))
            })
            .with_step("Remove redundant data", |s| Ok(remove_redundant_data(s)))
            .with_step("Remove non-semantic special characters", |s| {
                Ok(remove_special_characters(s))
            })
    }

    /// Append a step to the end of the chain.
    pub fn push<F>(&mut self, description: impl Into<String>, apply: F) -> &mut Self
    where
        F: Fn(&str) -> Result<String, FilterError> + Send + Sync + 'static,
    {
        self.steps.push(FilterStep::new(description, apply));
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_step<F>(mut self, description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&str) -> Result<String, FilterError> + Send + Sync + 'static,
    {
        self.push(description, apply);
        self
    }

    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.steps.iter().map(FilterStep::description).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order and trim the result.
    ///
    /// The first failing step aborts the whole chain; later steps depend on
    /// the cleanup done by earlier ones, so skipping is never safe.
    pub fn run(&self, raw: &str) -> Result<String, SanitizeError> {
        let mut text = raw.to_string();
        for step in &self.steps {
            text = step.apply(&text).map_err(|source| {
                error!(step = %step.description, "Markdown filter failed: {}", source);
                SanitizeError {
                    step: step.description.clone(),
                    source,
                }
            })?;
            debug!(step = %step.description, len = text.len(), "Applied markdown filter");
        }
        Ok(text.trim().to_string())
    }
}

static GOOGLE_MAPS_CHAIN: LazyLock<FilterChain> = LazyLock::new(FilterChain::google_maps);

/// Clean raw markdown with the Google Maps filter chain.
pub fn sanitize(raw: &str) -> Result<String, SanitizeError> {
    GOOGLE_MAPS_CHAIN.run(raw)
}
