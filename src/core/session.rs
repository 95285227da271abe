//! Session controller: the single owner of rates, history and what the user sees.
//!
//! A session moves `Uninitialized -> Hydrating -> Ready`. From `Ready` a
//! refresh passes through the transient `Refreshing` state and always comes
//! back to `Ready`, whatever the feed did. The presentation layer only calls
//! the operations below and reads the observable state; it never touches the
//! rate cache or the ledger directly.

use crate::core::convert::{convert, validate_amount};
use crate::core::currency::CurrencySet;
use crate::core::error::{ConversionError, RefreshError};
use crate::core::history::{ConversionRecord, HistoryLedger};
use crate::core::rate_cache::RateCacheManager;
use crate::core::rates::{RateFeed, RateSnapshot};
use crate::core::retry::RetryPolicy;
use crate::core::store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info};

pub const STALE_RATES_MESSAGE: &str = "Could not reach the rate feed. Using saved rates.";
pub const NO_RATES_MESSAGE: &str = "No connection and no saved rates.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Hydrating,
    Ready,
    Refreshing,
}

/// Where the rates in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateStatus {
    /// Nothing loaded yet.
    Unknown,
    /// Restored from disk; the feed has not been asked this session.
    Saved,
    /// Fetched from the feed during this session.
    Live,
    /// The last refresh failed; older rates are still in use.
    Stale,
    /// The last refresh failed and there are no rates at all.
    NoRatesAvailable,
}

pub struct Session {
    currencies: CurrencySet,
    rates: RateCacheManager,
    history: HistoryLedger,
    retry: RetryPolicy,
    state: SessionState,
    status: RateStatus,
    online: bool,
    busy: bool,
    last_error: Option<String>,
    last_result: Option<ConversionRecord>,
    source: String,
    target: String,
}

impl Session {
    pub fn new(
        currencies: CurrencySet,
        feed: Arc<dyn RateFeed>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let base = currencies.base().to_string();
        let target = currencies
            .iter()
            .map(|c| c.code.clone())
            .find(|code| *code != base)
            .unwrap_or_else(|| base.clone());

        Session {
            rates: RateCacheManager::new(feed, Arc::clone(&store), &base),
            history: HistoryLedger::new(store),
            currencies,
            retry: RetryPolicy::default(),
            state: SessionState::Uninitialized,
            status: RateStatus::Unknown,
            online: true,
            busy: false,
            last_error: None,
            last_result: None,
            source: base,
            target,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the initial currency pair.
    pub fn with_selection(mut self, source: &str, target: &str) -> Result<Self, ConversionError> {
        let source = self.currencies.resolve(source)?;
        let target = self.currencies.resolve(target)?;
        self.source = source;
        self.target = target;
        Ok(self)
    }

    /// Loads saved rates and history, then fetches rates if none were saved.
    ///
    /// Never fails: unreadable saved data is treated as absent and a failed
    /// first fetch leaves the session `Ready` with [`RateStatus::NoRatesAvailable`].
    pub async fn initialize(&mut self) {
        if self.state != SessionState::Uninitialized {
            debug!(state = ?self.state, "Session already initialized");
            return;
        }

        self.state = SessionState::Hydrating;
        let saved = self.rates.load_persisted().await;
        self.rates.hydrate(saved);
        self.history.load().await;
        self.state = SessionState::Ready;

        if self.rates.snapshot().is_some() {
            self.status = RateStatus::Saved;
            info!("Session ready with saved rates");
        } else {
            info!("No saved rates, fetching from feed");
            self.refresh().await;
        }
    }

    /// Asks the feed for fresh rates and updates the online flag and message.
    ///
    /// Ignored unless the session is `Ready` and no refresh is in flight.
    pub async fn refresh(&mut self) -> RateStatus {
        if self.state != SessionState::Ready || self.busy {
            debug!(state = ?self.state, busy = self.busy, "Refresh ignored");
            return self.status;
        }

        self.busy = true;
        self.state = SessionState::Refreshing;

        match self.rates.refresh_with(&self.retry).await {
            Ok(_) => {
                self.online = true;
                self.status = RateStatus::Live;
                self.last_error = None;
            }
            Err(RefreshError::FeedUnavailable { .. }) => {
                self.online = false;
                self.status = RateStatus::Stale;
                self.last_error = Some(STALE_RATES_MESSAGE.to_string());
            }
            Err(RefreshError::NoRatesAvailable { .. }) => {
                self.online = false;
                self.status = RateStatus::NoRatesAvailable;
                self.last_error = Some(NO_RATES_MESSAGE.to_string());
            }
        }

        self.busy = false;
        self.state = SessionState::Ready;
        self.status
    }

    /// Converts `amount` and records it in the history.
    ///
    /// Invalid input is rejected before anything changes. Otherwise the pair
    /// becomes the selection, clearing a result shown for a different pair,
    /// and `Ok(None)` is returned when the session cannot convert yet (not
    /// ready, refreshing, or no rates).
    pub async fn convert(
        &mut self,
        amount: f64,
        source: &str,
        target: &str,
    ) -> Result<Option<ConversionRecord>, ConversionError> {
        let source = self.currencies.resolve(source)?;
        let target = self.currencies.resolve(target)?;
        let amount = validate_amount(amount)?;
        if (source.as_str(), target.as_str()) != self.selection() {
            self.source = source;
            self.target = target;
            self.last_result = None;
        }

        if !self.can_convert() {
            debug!(state = ?self.state, "Conversion ignored, no usable rates");
            return Ok(None);
        }
        let Some(snapshot) = self.rates.snapshot() else {
            return Ok(None);
        };

        let result = convert(
            amount,
            &self.source,
            &self.target,
            &snapshot.table,
            &self.currencies,
        )?;
        let record = self
            .history
            .record(&self.source, &self.target, amount, result)
            .await;
        self.last_result = Some(record.clone());
        Ok(Some(record))
    }

    /// Converts using the current selection.
    pub async fn convert_selected(
        &mut self,
        amount: f64,
    ) -> Result<Option<ConversionRecord>, ConversionError> {
        let (source, target) = (self.source.clone(), self.target.clone());
        self.convert(amount, &source, &target).await
    }

    /// Exchanges source and target. The displayed result no longer applies, so it is cleared.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
        self.last_result = None;
    }

    pub fn select_source(&mut self, code: &str) -> Result<(), ConversionError> {
        self.source = self.currencies.resolve(code)?;
        self.last_result = None;
        Ok(())
    }

    pub fn select_target(&mut self, code: &str) -> Result<(), ConversionError> {
        self.target = self.currencies.resolve(code)?;
        self.last_result = None;
        Ok(())
    }

    pub async fn clear_history(&mut self) {
        self.history.clear().await;
    }

    /// Whether a conversion would run right now; drives the convert trigger.
    pub fn can_convert(&self) -> bool {
        self.state == SessionState::Ready && !self.busy && self.rates.snapshot().is_some()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> RateStatus {
        self.status
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_result(&self) -> Option<&ConversionRecord> {
        self.last_result.as_ref()
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.rates.snapshot()
    }

    pub fn history(&self) -> &[ConversionRecord] {
        self.history.entries()
    }

    pub fn selection(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }

    pub fn currencies(&self) -> &CurrencySet {
        &self.currencies
    }
}
