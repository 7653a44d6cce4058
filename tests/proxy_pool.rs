//! Proxy pool tests against a local proxy-list server and on-disk stores.

mod common;

use std::fs;
use std::time::Duration;

use common::page_server::{Page, PageServer};
use listscrape::http_client::build_client;
use listscrape::proxy::{
    FilePoolStore, HtmlTableSource, PlainTextSource, Pool, PoolStore, ProxyRotator, ProxySource,
    FREE_PROXY_LIST_COLUMNS, FREE_PROXY_LIST_SELECTOR,
};
use tempfile::tempdir;

const PLAIN_LIST: &str = "\
Proxy list | Updated hourly
1.1.1.1:8080 US-N-S +
2.2.2.2:3128 DE-A -
";

fn table_page() -> String {
    let row = |ip: &str, port: &str| {
        format!(
            "<tr><td>{}</td><td>{}</td><td>CA</td><td>Canada</td><td>anonymous</td><td>no</td><td>yes</td><td>1 min ago</td></tr>",
            ip, port
        )
    };
    format!(
        r#"<html><body><div class="fpl-list"><table class="table"><thead><tr><th>IP Address</th></tr></thead><tbody>{}{}</tbody></table></div></body></html>"#,
        row("3.3.3.3", "80"),
        row("4.4.4.4", "8000")
    )
}

fn sources(server: &PageServer, html_path: &str) -> Vec<Box<dyn ProxySource>> {
    vec![
        Box::new(PlainTextSource::new(server.url("/proxy.txt"))),
        Box::new(HtmlTableSource::new(
            server.url(html_path),
            FREE_PROXY_LIST_SELECTOR,
            FREE_PROXY_LIST_COLUMNS,
        )),
    ]
}

fn lines(store: &FilePoolStore, pool: Pool) -> Vec<String> {
    store
        .read(pool)
        .unwrap()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[tokio::test]
async fn test_refresh_and_lifo_acquire_on_disk() {
    let server = PageServer::start(vec![
        ("/proxy.txt", Page::text(PLAIN_LIST)),
        ("/list", Page::html(table_page())),
    ]);
    let dir = tempdir().unwrap();
    let store = FilePoolStore::new(dir.path().join("proxy_store"));
    let client = build_client(None, Duration::from_secs(5), None).unwrap();
    let mut rotator = ProxyRotator::with_sources(store.clone(), client, sources(&server, "/list"));

    assert_eq!(rotator.refresh_pool().await.unwrap(), 4);
    assert_eq!(
        lines(&store, Pool::Available),
        vec!["1.1.1.1:8080", "2.2.2.2:3128", "3.3.3.3:80", "4.4.4.4:8000"]
    );

    // Pool of N = 4: the last entry comes out first.
    let mut dispensed = Vec::new();
    for _ in 0..4 {
        dispensed.push(rotator.acquire_proxy().await.unwrap().unwrap());
    }
    assert_eq!(
        dispensed,
        vec![
            "http://4.4.4.4:8000",
            "http://3.3.3.3:80",
            "http://2.2.2.2:3128",
            "http://1.1.1.1:8080",
        ]
    );
    assert!(lines(&store, Pool::Available).is_empty());
    assert_eq!(lines(&store, Pool::Used).len(), 4);
    assert_eq!(server.hits("/proxy.txt"), 1);

    // The (N+1)th call refreshes automatically.
    let next = rotator.acquire_proxy().await.unwrap();
    assert_eq!(next.as_deref(), Some("http://4.4.4.4:8000"));
    assert_eq!(server.hits("/proxy.txt"), 2);
    assert_eq!(server.hits("/list"), 2);
    assert_eq!(lines(&store, Pool::Available).len(), 3);
    assert_eq!(lines(&store, Pool::Used), vec!["4.4.4.4:8000"]);
}

#[tokio::test]
async fn test_missing_store_triggers_refresh() {
    let server = PageServer::start(vec![
        ("/proxy.txt", Page::text(PLAIN_LIST)),
        ("/list", Page::html(table_page())),
    ]);
    let dir = tempdir().unwrap();
    let store = FilePoolStore::new(dir.path());
    let client = build_client(None, Duration::from_secs(5), None).unwrap();
    let mut rotator = ProxyRotator::with_sources(store.clone(), client, sources(&server, "/list"));

    assert!(!store.exists(Pool::Available));
    let first = rotator.acquire_proxy().await.unwrap();
    assert_eq!(first.as_deref(), Some("http://4.4.4.4:8000"));
    assert_eq!(server.hits("/proxy.txt"), 1);

    let status = rotator.status().unwrap();
    assert_eq!((status.available, status.used), (3, 1));
}

#[tokio::test]
async fn test_failing_table_source_keeps_plain_results() {
    let server = PageServer::start(vec![
        ("/proxy.txt", Page::text(PLAIN_LIST)),
        ("/down", Page::status(503)),
    ]);
    let dir = tempdir().unwrap();
    let store = FilePoolStore::new(dir.path());
    let client = build_client(None, Duration::from_secs(5), None).unwrap();
    let mut rotator = ProxyRotator::with_sources(store.clone(), client, sources(&server, "/down"));

    assert!(rotator.refresh_pool().await.is_err());
    assert_eq!(
        lines(&store, Pool::Available),
        vec!["1.1.1.1:8080", "2.2.2.2:3128"]
    );
}

#[tokio::test]
async fn test_refresh_resets_used_log() {
    let server = PageServer::start(vec![
        ("/proxy.txt", Page::text(PLAIN_LIST)),
        ("/list", Page::html(table_page())),
    ]);
    let dir = tempdir().unwrap();
    let mut store = FilePoolStore::new(dir.path());
    store
        .append(
            Pool::Used,
            &[listscrape::proxy::ProxyEntry::parse("9.9.9.9:99").unwrap()],
        )
        .unwrap();

    let client = build_client(None, Duration::from_secs(5), None).unwrap();
    let mut rotator = ProxyRotator::with_sources(store.clone(), client, sources(&server, "/list"));
    rotator.refresh_pool().await.unwrap();

    assert!(!store.exists(Pool::Used));
}

#[test]
fn test_clear_used_pool_on_disk() {
    let dir = tempdir().unwrap();
    let store = FilePoolStore::new(dir.path());
    let mut rotator = ProxyRotator::with_sources(store.clone(), reqwest_client(), Vec::new());

    // Absent store is fine.
    rotator.clear_used_pool().unwrap();

    fs::write(store.path(Pool::Used), "1.1.1.1:80\n2.2.2.2:80\n").unwrap();
    assert_eq!(rotator.status().unwrap().used, 2);

    rotator.clear_used_pool().unwrap();
    assert!(lines(&store, Pool::Used).is_empty());
    assert!(!store.path(Pool::Used).exists());
}

fn reqwest_client() -> reqwest::Client {
    build_client(None, Duration::from_secs(5), None).unwrap()
}
