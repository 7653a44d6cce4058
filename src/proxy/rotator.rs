//! Hands out one unused proxy per call from a refreshable pool.

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::sources::{HtmlTableSource, PlainTextSource, ProxySource};
use super::store::{Pool, PoolStore};
use super::ProxyError;

/// Entry counts for both pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub available: usize,
    pub used: usize,
}

/// Proxy pool backed by a [`PoolStore`] and replenished from
/// [`ProxySource`]s.
///
/// Dispensed proxies are not checked for liveness.
pub struct ProxyRotator<S> {
    store: S,
    sources: Vec<Box<dyn ProxySource>>,
    client: Client,
}

impl<S: PoolStore> ProxyRotator<S> {
    /// Rotator using the spys.me and free-proxy-list.net sources.
    pub fn new(store: S, client: Client) -> Self {
        Self::with_sources(
            store,
            client,
            vec![
                Box::new(PlainTextSource::default()),
                Box::new(HtmlTableSource::default()),
            ],
        )
    }

    pub fn with_sources(store: S, client: Client, sources: Vec<Box<dyn ProxySource>>) -> Self {
        Self {
            store,
            sources,
            client,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-scrape all sources into the available pool and reset the used log.
    ///
    /// The first source replaces the available pool, later ones are appended
    /// in order, duplicates included. Sources are written as they arrive, so
    /// if a later source fails the earlier results stay in the pool.
    pub async fn refresh_pool(&mut self) -> Result<usize, ProxyError> {
        self.store.clear(Pool::Used)?;

        if self.sources.is_empty() {
            warn!("No proxy sources configured");
            self.store.replace(Pool::Available, &[])?;
            return Ok(0);
        }

        let mut total = 0;
        for (index, source) in self.sources.iter().enumerate() {
            let entries = source.fetch(&self.client).await?;
            info!(source = source.name(), count = entries.len(), "Fetched proxies");
            if index == 0 {
                self.store.replace(Pool::Available, &entries)?;
            } else {
                self.store.append(Pool::Available, &entries)?;
            }
            total += entries.len();
        }

        info!(total, "Refreshed proxy pool");
        Ok(total)
    }

    /// Take the last available proxy, record it as used, and return it as an
    /// `http://ip:port` URL.
    ///
    /// Refreshes first if the pool has never been written, and again if it is
    /// empty. Returns `None` when the pool is still empty after that.
    pub async fn acquire_proxy(&mut self) -> Result<Option<String>, ProxyError> {
        if !self.store.exists(Pool::Available) {
            self.refresh_pool().await?;
        }

        if self.store.read(Pool::Available)?.is_empty() {
            info!("Proxy pool exhausted, refreshing");
            self.refresh_pool().await?;
        }

        let Some(entry) = self.store.pop_last(Pool::Available)? else {
            warn!("No proxies available after refresh");
            return Ok(None);
        };
        self.store.append(Pool::Used, std::slice::from_ref(&entry))?;

        Ok(Some(entry.to_url()))
    }

    /// Delete the used log. No error if it is already gone.
    pub fn clear_used_pool(&mut self) -> Result<(), ProxyError> {
        self.store.clear(Pool::Used)?;
        Ok(())
    }

    pub fn status(&self) -> Result<PoolStatus, ProxyError> {
        Ok(PoolStatus {
            available: self.store.read(Pool::Available)?.len(),
            used: self.store.read(Pool::Used)?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::proxy::{MemoryPoolStore, ProxyEntry};

    struct StaticSource {
        entries: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticSource {
        fn boxed(entries: Vec<&'static str>, calls: &Arc<AtomicUsize>) -> Box<dyn ProxySource> {
            Box::new(Self {
                entries,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl ProxySource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, _client: &Client) -> Result<Vec<ProxyEntry>, ProxyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .entries
                .iter()
                .filter_map(|s| ProxyEntry::parse(s))
                .collect())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ProxySource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self, _client: &Client) -> Result<Vec<ProxyEntry>, ProxyError> {
            Err(ProxyError::Status {
                url: "https://proxies.invalid/".to_string(),
                status: 503,
            })
        }
    }

    fn rotator(sources: Vec<Box<dyn ProxySource>>) -> ProxyRotator<MemoryPoolStore> {
        ProxyRotator::with_sources(MemoryPoolStore::new(), Client::new(), sources)
    }

    fn pool(rotator: &ProxyRotator<MemoryPoolStore>, pool: Pool) -> Vec<String> {
        rotator
            .store()
            .read(pool)
            .unwrap()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_orders_sources_and_keeps_duplicates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![
            StaticSource::boxed(vec!["1.1.1.1:80", "2.2.2.2:80"], &calls),
            StaticSource::boxed(vec!["2.2.2.2:80", "3.3.3.3:80"], &calls),
        ]);

        assert_eq!(rotator.refresh_pool().await.unwrap(), 4);
        assert_eq!(
            pool(&rotator, Pool::Available),
            vec!["1.1.1.1:80", "2.2.2.2:80", "2.2.2.2:80", "3.3.3.3:80"]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_acquire_is_lifo() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![StaticSource::boxed(
            vec!["1.1.1.1:80", "2.2.2.2:80", "3.3.3.3:80"],
            &calls,
        )]);
        rotator.refresh_pool().await.unwrap();

        let first = rotator.acquire_proxy().await.unwrap();
        assert_eq!(first.as_deref(), Some("http://3.3.3.3:80"));
        assert_eq!(
            rotator.status().unwrap(),
            PoolStatus {
                available: 2,
                used: 1
            }
        );
        assert_eq!(pool(&rotator, Pool::Used), vec!["3.3.3.3:80"]);
    }

    #[tokio::test]
    async fn test_exhaustion_triggers_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![StaticSource::boxed(
            vec!["1.1.1.1:80", "2.2.2.2:80"],
            &calls,
        )]);

        // Missing pool triggers the first refresh.
        assert_eq!(
            rotator.acquire_proxy().await.unwrap().as_deref(),
            Some("http://2.2.2.2:80")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            rotator.acquire_proxy().await.unwrap().as_deref(),
            Some("http://1.1.1.1:80")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool(&rotator, Pool::Used), vec!["2.2.2.2:80", "1.1.1.1:80"]);

        // Third call finds the pool empty and refreshes, which also resets
        // the used log.
        assert_eq!(
            rotator.acquire_proxy().await.unwrap().as_deref(),
            Some("http://2.2.2.2:80")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(pool(&rotator, Pool::Used), vec!["2.2.2.2:80"]);
    }

    #[tokio::test]
    async fn test_acquire_returns_none_when_sources_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![StaticSource::boxed(vec![], &calls)]);

        assert_eq!(rotator.acquire_proxy().await.unwrap(), None);
        // Once because the pool was missing, once because it was empty.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(pool(&rotator, Pool::Used).is_empty());
    }

    #[tokio::test]
    async fn test_second_source_failure_keeps_first_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![
            StaticSource::boxed(vec!["1.1.1.1:80"], &calls),
            Box::new(FailingSource),
        ]);

        let err = rotator.refresh_pool().await.unwrap_err();
        assert!(matches!(err, ProxyError::Status { status: 503, .. }));
        assert_eq!(pool(&rotator, Pool::Available), vec!["1.1.1.1:80"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates_from_acquire() {
        let mut rotator = rotator(vec![Box::new(FailingSource)]);
        assert!(rotator.acquire_proxy().await.is_err());
        assert!(!rotator.store().exists(Pool::Available));
    }

    #[tokio::test]
    async fn test_clear_used_pool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rotator = rotator(vec![StaticSource::boxed(vec!["1.1.1.1:80"], &calls)]);

        rotator.clear_used_pool().unwrap();
        rotator.acquire_proxy().await.unwrap();
        assert_eq!(rotator.status().unwrap().used, 1);

        rotator.clear_used_pool().unwrap();
        assert_eq!(rotator.status().unwrap().used, 0);
        rotator.clear_used_pool().unwrap();
    }
}
