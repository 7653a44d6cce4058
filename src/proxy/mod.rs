//! Proxy pool scraped from public proxy lists.
//!
//! - `store`: the available/used pools and their file and memory backends
//! - `sources`: proxy-list pages and their parsers
//! - `rotator`: refresh, acquire, and reset operations over a store

mod rotator;
mod sources;
mod store;

use thiserror::Error;

pub use rotator::{PoolStatus, ProxyRotator};
pub use sources::{
    parse_html_table, parse_plain_text, HtmlTableSource, PlainTextSource, ProxySource,
    FREE_PROXY_LIST_COLUMNS, FREE_PROXY_LIST_SELECTOR, FREE_PROXY_LIST_URL, SPYS_ME_URL,
};
pub use store::{
    FilePoolStore, MemoryPoolStore, Pool, PoolStore, ProxyEntry, AVAILABLE_FILENAME,
    USED_FILENAME,
};

/// Errors from proxy pool operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to fetch proxy source {url}: {error}")]
    Fetch {
        url: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("proxy source {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid proxy table selector: {0}")]
    Selector(String),

    #[error("proxy store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
