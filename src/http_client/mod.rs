//! Shared reqwest client construction.

mod user_agent;

pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::Duration;

use reqwest::{Client, Proxy};

/// Build an HTTP client.
///
/// `user_agent` follows [`resolve_user_agent`]; `proxy` is any URL reqwest
/// accepts (`http://`, `socks5://`).
pub fn build_client(
    user_agent: Option<&str>,
    timeout: Duration,
    proxy: Option<&str>,
) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(resolve_user_agent(user_agent))
        .timeout(timeout)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}
