//! Bounded, persisted ledger of past conversions.

use crate::core::schema;
use crate::core::store::{HISTORY_KEY, KeyValueStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of records kept in the ledger.
pub const HISTORY_CAPACITY: usize = 20;

// Ids are creation millis; saved ids further ahead than this cannot be trusted.
const MAX_ID_LEAD_MS: u64 = 24 * 60 * 60 * 1000;

/// A completed conversion. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: u64,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

/// Newest-first conversion history, capped at [`HISTORY_CAPACITY`].
pub struct HistoryLedger {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<ConversionRecord>,
    last_id: u64,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        HistoryLedger {
            store,
            entries: Vec::new(),
            last_id: 0,
        }
    }

    /// Restores the ledger from the store. Anything unreadable becomes an empty ledger.
    pub async fn load(&mut self) {
        self.entries = match self.store.get(HISTORY_KEY).await {
            Ok(Some(bytes)) => match schema::decode_history(&bytes) {
                Ok(mut records) => {
                    let limit = millis(Utc::now()).saturating_add(MAX_ID_LEAD_MS);
                    let total = records.len();
                    records.retain(|r| r.id <= limit);
                    if records.len() < total {
                        warn!(
                            dropped = total - records.len(),
                            "Discarding history records with out-of-range ids"
                        );
                    }
                    records.truncate(HISTORY_CAPACITY);
                    records
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable conversion history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read conversion history");
                Vec::new()
            }
        };
        self.last_id = self
            .entries
            .iter()
            .map(|r| r.id)
            .max()
            .unwrap_or(0)
            .max(self.last_id);
        debug!("Loaded {} history entries", self.entries.len());
    }

    /// Records a conversion as the newest entry and persists the ledger.
    pub async fn record(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
        result: f64,
    ) -> ConversionRecord {
        let timestamp = Utc::now();
        let id = self.next_id(timestamp);
        let entry = ConversionRecord {
            id,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            result,
            timestamp,
        };

        self.entries.insert(0, entry.clone());
        self.entries.truncate(HISTORY_CAPACITY);
        self.persist().await;
        entry
    }

    /// Empties the ledger and drops the persisted copy.
    pub async fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY).await {
            warn!(error = %e, "Failed to remove persisted conversion history");
        }
    }

    pub fn entries(&self) -> &[ConversionRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Millisecond timestamps, bumped so ids stay strictly increasing.
    fn next_id(&mut self, now: DateTime<Utc>) -> u64 {
        self.last_id = millis(now).max(self.last_id.saturating_add(1));
        self.last_id
    }

    async fn persist(&self) {
        let bytes = match schema::encode_history(&self.entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode conversion history");
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, bytes).await {
            warn!(error = %e, "Failed to persist conversion history");
        }
    }
}

fn millis(ts: DateTime<Utc>) -> u64 {
    u64::try_from(ts.timestamp_millis()).unwrap_or(0)
}
