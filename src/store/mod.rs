pub mod disk;
pub mod memory;

use crate::core::store::KeyValueStore;
use disk::DiskStore;
use memory::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Opens the durable store under `data_path`, falling back to memory when it cannot be opened.
pub fn open_store(data_path: &Path) -> Arc<dyn KeyValueStore> {
    match DiskStore::open(data_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                error = %e,
                path = %data_path.display(),
                "Could not open data store, history and rates will not be saved"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
