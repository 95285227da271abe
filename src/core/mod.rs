//! Rate acquisition, conversion and history: everything below the CLI.

pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod history;
pub mod log;
pub mod rate_cache;
pub mod rates;
pub mod retry;
pub mod schema;
pub mod session;
pub mod store;

// Re-export main types for cleaner imports
pub use currency::{Currency, CurrencySet};
pub use error::{ConversionError, FeedError, RefreshError};
pub use history::ConversionRecord;
pub use rates::{RateFeed, RateSnapshot, RateTable};
pub use session::{RateStatus, Session, SessionState};
pub use store::KeyValueStore;
