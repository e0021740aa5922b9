use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Lock table keyed by subject id. Reconciliations for the same subject
/// serialize on the per-key async mutex; different subject ids never share
/// a lock. Entries are pruned once no reconciliation holds them.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self { Self::default() }

    /// Fetch (or create) the mutex for `key`. Stale entries held by nobody
    /// are dropped on the way through.
    pub fn for_key(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock();
        map.retain(|_, m| Arc::strong_count(m) > 1);
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize { self.inner.lock().len() }
}
