//! Owns the live rate snapshot: refreshes it from the feed, persists it, and
//! keeps the last known-good rates when the feed fails.

use crate::core::error::{FeedError, RefreshError};
use crate::core::rates::{RateFeed, RateSnapshot, RateTable};
use crate::core::retry::{RetryPolicy, with_retry};
use crate::core::schema;
use crate::core::store::{KeyValueStore, RATES_KEY};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RateCacheManager {
    feed: Arc<dyn RateFeed>,
    store: Arc<dyn KeyValueStore>,
    base: String,
    current: Option<RateSnapshot>,
}

impl RateCacheManager {
    pub fn new(feed: Arc<dyn RateFeed>, store: Arc<dyn KeyValueStore>, base: &str) -> Self {
        RateCacheManager {
            feed,
            store,
            base: base.to_uppercase(),
            current: None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.current.as_ref()
    }

    /// Reads the persisted snapshot, if there is a usable one.
    pub async fn load_persisted(&self) -> Option<RateSnapshot> {
        let bytes = match self.store.get(RATES_KEY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read saved rates");
                return None;
            }
        };
        match schema::decode_snapshot(&bytes, &self.base) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable saved rates");
                None
            }
        }
    }

    /// Installs a previously saved snapshot without touching the network.
    pub fn hydrate(&mut self, snapshot: Option<RateSnapshot>) {
        self.current = match snapshot {
            Some(s) if !s.table.base().eq_ignore_ascii_case(&self.base) => {
                warn!(
                    saved_base = %s.table.base(),
                    base = %self.base,
                    "Ignoring saved rates quoted in a different base currency"
                );
                None
            }
            other => other,
        };
        if let Some(s) = &self.current {
            debug!(captured_at = %s.captured_at, rates = s.table.len(), "Hydrated rates");
        }
    }

    /// Fetches a fresh table and replaces the snapshot. On failure the current
    /// snapshot is left exactly as it was.
    pub async fn refresh(&mut self) -> Result<RateSnapshot, RefreshError> {
        self.refresh_with(&RetryPolicy::default()).await
    }

    /// Like [`refresh`](Self::refresh), retrying transient feed failures per `policy`.
    pub async fn refresh_with(
        &mut self,
        policy: &RetryPolicy,
    ) -> Result<RateSnapshot, RefreshError> {
        let feed = &self.feed;
        let base = &self.base;
        let fetched = with_retry(
            move || feed.fetch_rates(base),
            policy.retries,
            policy.delay_ms,
            FeedError::is_transient,
        )
        .await;

        match fetched {
            Ok(table) => {
                let snapshot = self.install(table, Utc::now());
                info!(rates = snapshot.table.len(), "Rates refreshed");
                self.persist(&snapshot).await;
                Ok(snapshot)
            }
            Err(source) if self.current.is_some() => {
                warn!(error = %source, "Rate refresh failed, keeping saved rates");
                Err(RefreshError::FeedUnavailable {
                    has_snapshot: true,
                    source,
                })
            }
            Err(source) => {
                warn!(error = %source, "Rate refresh failed and no rates are available");
                Err(RefreshError::NoRatesAvailable { source })
            }
        }
    }

    // Capture times never go backwards, even if the wall clock does.
    fn install(&mut self, table: RateTable, now: DateTime<Utc>) -> RateSnapshot {
        let captured_at = match &self.current {
            Some(previous) if previous.captured_at > now => previous.captured_at,
            _ => now,
        };
        let snapshot = RateSnapshot::new(table, captured_at);
        self.current = Some(snapshot.clone());
        snapshot
    }

    async fn persist(&self, snapshot: &RateSnapshot) {
        let bytes = match schema::encode_snapshot(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode rates");
                return;
            }
        };
        if let Err(e) = self.store.set(RATES_KEY, bytes).await {
            warn!(error = %e, "Failed to persist rates");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::error::StoreError;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Feed that replays scripted responses in order, failing once they run out.
    pub(crate) struct ScriptedFeed {
        responses: Mutex<VecDeque<Result<HashMap<String, f64>, FeedError>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedFeed {
        pub(crate) fn new(responses: Vec<Result<HashMap<String, f64>, FeedError>>) -> Self {
            ScriptedFeed {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateFeed for ScriptedFeed {
        async fn fetch_rates(&self, base: &str) -> Result<RateTable, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(raw)) => Ok(RateTable::new(base, raw)),
                Some(Err(e)) => Err(e),
                None => Err(FeedError::Unavailable("connection refused".to_string())),
            }
        }
    }

    /// Store whose writes always fail.
    pub(crate) struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk on fire")))
        }
    }

    pub(crate) fn ars_rates() -> HashMap<String, f64> {
        [
            ("USD".to_string(), 0.0011),
            ("EUR".to_string(), 0.00095),
            ("GBP".to_string(), 0.00082),
            ("JPY".to_string(), 0.165),
        ]
        .into_iter()
        .collect()
    }

    fn manager(
        responses: Vec<Result<HashMap<String, f64>, FeedError>>,
    ) -> (RateCacheManager, Arc<ScriptedFeed>, Arc<MemoryStore>) {
        let feed = Arc::new(ScriptedFeed::new(responses));
        let store = Arc::new(MemoryStore::new());
        let manager = RateCacheManager::new(feed.clone(), store.clone(), "ARS");
        (manager, feed, store)
    }

    #[tokio::test]
    async fn test_refresh_replaces_and_persists_snapshot() {
        let (mut manager, feed, store) = manager(vec![Ok(ars_rates())]);

        let snapshot = manager.refresh().await.unwrap();
        assert_eq!(feed.calls(), 1);
        assert_eq!(snapshot.table.rate("USD"), Some(0.0011));
        assert_eq!(manager.snapshot(), Some(&snapshot));

        let saved = store.get(RATES_KEY).await.unwrap().unwrap();
        assert_eq!(schema::decode_snapshot(&saved, "ARS").unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_existing_snapshot() {
        let (mut manager, _feed, _store) = manager(vec![
            Ok(ars_rates()),
            Err(FeedError::Unavailable("timeout".to_string())),
        ]);
        manager.refresh().await.unwrap();
        let before = manager.snapshot().cloned();

        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(
            err,
            RefreshError::FeedUnavailable {
                has_snapshot: true,
                ..
            }
        ));
        assert_eq!(manager.snapshot().cloned(), before);
    }

    #[tokio::test]
    async fn test_failed_refresh_without_snapshot_has_no_rates() {
        let (mut manager, _feed, _store) =
            manager(vec![Err(FeedError::Malformed("missing rates".to_string()))]);

        let err = manager.refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::NoRatesAvailable { .. }));
        assert!(manager.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_hydrate_does_not_fetch() {
        let (mut manager, feed, _store) = manager(vec![]);
        let snapshot = RateSnapshot::new(RateTable::new("ARS", ars_rates()), Utc::now());

        manager.hydrate(Some(snapshot.clone()));
        assert_eq!(feed.calls(), 0);
        assert_eq!(manager.snapshot(), Some(&snapshot));

        manager.hydrate(None);
        assert!(manager.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_hydrate_rejects_other_base() {
        let (mut manager, _feed, _store) = manager(vec![]);
        let snapshot = RateSnapshot::new(RateTable::new("USD", ars_rates()), Utc::now());
        manager.hydrate(Some(snapshot));
        assert!(manager.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_load_persisted_round_trip() {
        let (mut manager, feed, store) = manager(vec![Ok(ars_rates())]);
        let snapshot = manager.refresh().await.unwrap();

        let restarted = RateCacheManager::new(feed, store, "ARS");
        assert_eq!(restarted.load_persisted().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_load_persisted_ignores_garbage() {
        let (manager, _feed, store) = manager(vec![]);
        store.set(RATES_KEY, b"[1, 2".to_vec()).await.unwrap();
        assert!(manager.load_persisted().await.is_none());
    }

    #[tokio::test]
    async fn test_capture_time_is_monotonic() {
        let (mut manager, _feed, _store) = manager(vec![]);
        let later = Utc::now() + Duration::hours(1);
        manager.hydrate(Some(RateSnapshot::new(
            RateTable::new("ARS", ars_rates()),
            later,
        )));

        let snapshot = manager.install(RateTable::new("ARS", ars_rates()), Utc::now());
        assert_eq!(snapshot.captured_at, later);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_fail_refresh() {
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(ars_rates())]));
        let mut manager = RateCacheManager::new(feed, Arc::new(BrokenStore), "ARS");

        assert!(manager.load_persisted().await.is_none());
        let snapshot = manager.refresh().await.unwrap();
        assert_eq!(manager.snapshot(), Some(&snapshot));
    }

    #[tokio::test]
    async fn test_refresh_with_retries_transient_failures() {
        let (mut manager, feed, _store) = manager(vec![
            Err(FeedError::Unavailable("timeout".to_string())),
            Ok(ars_rates()),
        ]);
        let policy = RetryPolicy {
            retries: 2,
            delay_ms: 1,
        };

        let snapshot = manager.refresh_with(&policy).await.unwrap();
        assert_eq!(feed.calls(), 2);
        assert_eq!(snapshot.table.rate("EUR"), Some(0.00095));
    }

    #[tokio::test]
    async fn test_refresh_with_does_not_retry_malformed() {
        let (mut manager, feed, _store) = manager(vec![
            Err(FeedError::Malformed("result: error".to_string())),
            Ok(ars_rates()),
        ]);
        let policy = RetryPolicy {
            retries: 2,
            delay_ms: 1,
        };

        assert!(manager.refresh_with(&policy).await.is_err());
        assert_eq!(feed.calls(), 1);
    }
}
