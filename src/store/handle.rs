//! Shareable async handle over the catalog store.
//!
//! SQLite calls block, so every operation runs on tokio's blocking pool.
//! The single connection is guarded by a mutex; each closure runs to
//! completion (including its transaction) before the next one starts.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::{CatalogStore, StoreOptions};
use crate::catalog::{CatalogResult, Projection};

/// Cloneable handle used by request handlers
#[derive(Debug, Clone)]
pub struct Catalog {
    inner: Arc<Mutex<CatalogStore>>,
    options: StoreOptions,
}

impl Catalog {
    pub fn new(store: CatalogStore) -> Self {
        let options = store.options();
        Self {
            inner: Arc::new(Mutex::new(store)),
            options,
        }
    }

    /// Open a database file on the blocking pool
    pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> CatalogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let store =
            tokio::task::spawn_blocking(move || CatalogStore::open(path, options)).await??;
        Ok(Self::new(store))
    }

    pub fn open_in_memory(options: StoreOptions) -> CatalogResult<Self> {
        Ok(Self::new(CatalogStore::open_in_memory(options)?))
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn public_projection(&self) -> Projection {
        Projection::Public {
            category_cap: self.options.public_category_cap,
        }
    }

    /// Run a read-only closure against the store
    pub async fn read<T, F>(&self, f: F) -> CatalogResult<T>
    where
        F: FnOnce(&CatalogStore) -> CatalogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let store = inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&store)
        })
        .await?
    }

    /// Run a mutating closure against the store
    pub async fn write<T, F>(&self, f: F) -> CatalogResult<T>
    where
        F: FnOnce(&mut CatalogStore) -> CatalogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut store = inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut store)
        })
        .await?
    }
}
