//! Per-session turn serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one async mutex per session id so concurrent turns for the same
/// session run one after another and the transcript grows monotonically.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only referenced by the map are idle.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(session_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Sessions with a turn running or waiting.
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .map(|map| map.values().filter(|lock| Arc::strong_count(lock) > 1).count())
            .unwrap_or(0)
    }
}
