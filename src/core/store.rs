//! Key-value persistence abstraction

use crate::core::error::StoreError;
use async_trait::async_trait;

/// Key under which the latest rate snapshot is stored.
pub const RATES_KEY: &str = "converter-rates";
/// Key under which the conversion history is stored.
pub const HISTORY_KEY: &str = "converter-history";

/// Durable byte store. Copies held here are a recovery seed, never authoritative.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
