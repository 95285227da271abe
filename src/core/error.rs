//! Error taxonomy for the rate and conversion engine.

use thiserror::Error;

/// Failure of a single rate feed request.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Rate feed unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed rate feed response: {0}")]
    Malformed(String),
}

impl FeedError {
    /// Transport-level failures are worth another attempt, bad payloads are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Unavailable(_))
    }
}

/// Outcome of a failed refresh, as seen by the session.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Rate feed unavailable, keeping saved rates: {source}")]
    FeedUnavailable {
        has_snapshot: bool,
        #[source]
        source: FeedError,
    },

    #[error("No rates available: {source}")]
    NoRatesAvailable {
        #[source]
        source: FeedError,
    },
}

impl RefreshError {
    pub fn has_snapshot(&self) -> bool {
        match self {
            RefreshError::FeedUnavailable { has_snapshot, .. } => *has_snapshot,
            RefreshError::NoRatesAvailable { .. } => false,
        }
    }
}

/// Caller-input errors raised by the conversion engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Missing rate for currency: {0}")]
    MissingRate(String),
}

/// Persistence failure. Never fatal; callers log and carry on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Problems decoding a persisted record.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Unsupported record version {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::Malformed(e.to_string())
    }
}
