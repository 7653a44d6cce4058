//! Markdown generation and cleanup.
//!
//! - `filters`: the individual Google Maps cleanup passes
//! - `chain`: ordered, named filter steps with per-step error reporting
//! - `generator`: HTML to markdown plus the sanitizer stage

mod chain;
pub mod filters;
mod generator;

pub use chain::{sanitize, FilterChain, FilterError, FilterStep, SanitizeError};
pub use generator::{
    DefaultMarkdownGenerator, MarkdownError, MarkdownGenerationResult, MarkdownGenerator,
    MarkdownPipeline,
};
