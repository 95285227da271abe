//! Rate tables, snapshots and the rate feed abstraction

use crate::core::error::FeedError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Rates quoted as "units of currency per 1 unit of base".
///
/// The base currency is implicitly present at rate 1. Every stored rate is
/// finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Builds a table from raw feed data, dropping entries that are not usable rates.
    pub fn new(base: &str, raw: HashMap<String, f64>) -> Self {
        let base = base.to_uppercase();
        let mut rates = BTreeMap::new();
        for (code, rate) in raw {
            if !rate.is_finite() || rate <= 0.0 {
                warn!(currency = %code, rate, "Dropping invalid rate");
                continue;
            }
            rates.insert(code.to_uppercase(), rate);
        }
        RateTable { base, rates }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Rate for `code`, with the base always at 1.
    pub fn rate(&self, code: &str) -> Option<f64> {
        if code.eq_ignore_ascii_case(&self.base) {
            return Some(1.0);
        }
        self.rates.get(&code.to_uppercase()).copied()
    }

    /// Explicit entries, sorted by code. May or may not include the base.
    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// A rate table captured at a point in time. Unit of persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub captured_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(table: RateTable, captured_at: DateTime<Utc>) -> Self {
        RateSnapshot { table, captured_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.captured_at
    }
}

#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Fetches the latest full rate table quoted against `base`.
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, FeedError>;
}
