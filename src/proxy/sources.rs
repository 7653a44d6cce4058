//! Public proxy-list sources.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::store::ProxyEntry;
use super::ProxyError;

/// Plain-text listing with embedded `ip:port` tokens.
pub const SPYS_ME_URL: &str = "https://spys.me/proxy.txt";
/// HTML table listing.
pub const FREE_PROXY_LIST_URL: &str = "https://free-proxy-list.net/";
/// Cells of the free-proxy-list.net table.
pub const FREE_PROXY_LIST_SELECTOR: &str = ".fpl-list .table tbody tr td";
/// Cells per row in the free-proxy-list.net table.
pub const FREE_PROXY_LIST_COLUMNS: usize = 8;

static IP_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+){3}:[0-9]+").unwrap());

/// A page that lists candidate proxies.
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// Short name for logs and errors.
    fn name(&self) -> &str;

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyEntry>, ProxyError>;
}

/// Source whose body contains `ip:port` tokens anywhere in the text.
#[derive(Debug, Clone)]
pub struct PlainTextSource {
    url: String,
}

impl PlainTextSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for PlainTextSource {
    fn default() -> Self {
        Self::new(SPYS_ME_URL)
    }
}

#[async_trait]
impl ProxySource for PlainTextSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyEntry>, ProxyError> {
        let body = get_text(client, &self.url).await?;
        Ok(parse_plain_text(&body))
    }
}

/// Source that lists proxies in an HTML table, IP in the first column and
/// port in the second.
#[derive(Debug, Clone)]
pub struct HtmlTableSource {
    url: String,
    cell_selector: String,
    columns: usize,
}

impl HtmlTableSource {
    pub fn new(url: impl Into<String>, cell_selector: impl Into<String>, columns: usize) -> Self {
        Self {
            url: url.into(),
            cell_selector: cell_selector.into(),
            columns,
        }
    }
}

impl Default for HtmlTableSource {
    fn default() -> Self {
        Self::new(
            FREE_PROXY_LIST_URL,
            FREE_PROXY_LIST_SELECTOR,
            FREE_PROXY_LIST_COLUMNS,
        )
    }
}

#[async_trait]
impl ProxySource for HtmlTableSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<ProxyEntry>, ProxyError> {
        let body = get_text(client, &self.url).await?;
        parse_html_table(&body, &self.cell_selector, self.columns)
    }
}

async fn get_text(client: &Client, url: &str) -> Result<String, ProxyError> {
    let fetch_err = |error| ProxyError::Fetch {
        url: url.to_string(),
        error,
    };

    let response = client.get(url).send().await.map_err(fetch_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProxyError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.text().await.map_err(fetch_err)?;
    debug!(url, bytes = body.len(), "Fetched proxy source");
    Ok(body)
}

/// Extract every `ip:port` token from free-form text, in order.
pub fn parse_plain_text(body: &str) -> Vec<ProxyEntry> {
    IP_PORT
        .find_iter(body)
        .filter_map(|m| ProxyEntry::parse(m.as_str()))
        .collect()
}

/// Read table cells in groups of `columns`; column 0 is the IP, column 1
/// the port. A trailing partial row without a port is ignored.
pub fn parse_html_table(
    html: &str,
    cell_selector: &str,
    columns: usize,
) -> Result<Vec<ProxyEntry>, ProxyError> {
    let selector =
        Selector::parse(cell_selector).map_err(|e| ProxyError::Selector(e.to_string()))?;
    let document = Html::parse_document(html);

    let cells: Vec<String> = document
        .select(&selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect();

    Ok(cells
        .chunks(columns.max(2))
        .filter(|row| row.len() >= 2)
        .filter_map(|row| ProxyEntry::from_parts(&row[0], &row[1]))
        .collect())
}
