//! listscrape - listing page scraper.
//!
//! Crawls job and business listing pages, converts them to markdown,
//! cleans Google Maps noise out of that markdown, and rotates through
//! proxies scraped from public proxy lists.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod extract;
pub mod http_client;
pub mod markdown;
pub mod proxy;
