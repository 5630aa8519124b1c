//! A per-key single-flight cache.
//!
//! The first caller for a key runs the initializer; concurrent callers for
//! the same key await the same in-flight cell and observe the same result.
//! Successful values are retained for the cache's lifetime. A failed
//! initialization leaves the cell empty; inputs are immutable, so a retry by
//! a later caller reproduces the identical failure.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::Result;

pub(crate) struct SingleFlight<K, V> {
    cells: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Get the cached value for `key`, running `init` at most once
    /// concurrently per key to produce it.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        // The map guard must not be held across the await below.
        let cell = self
            .cells
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        cell.get_or_try_init(init).await.cloned()
    }
}
