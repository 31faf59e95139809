//! Outstanding requests keyed by request id

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::protocol::ResponseData;

pub type Resolution = Result<ResponseData, String>;

/// Hands out ascending request ids and routes each response to the one
/// receiver registered for its id. Every entry resolves at most once.
#[derive(Debug, Default)]
pub struct PendingRequests {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, flume::Sender<Resolution>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and a receiver for its response
    pub fn register(&self) -> (u64, flume::Receiver<Resolution>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = flume::bounded(1);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id, tx);
        }
        (id, rx)
    }

    /// Deliver a response. Returns false for unknown or already-resolved ids,
    /// which are dropped.
    pub fn resolve(&self, id: u64, resolution: Resolution) -> bool {
        let entry = match self.entries.lock() {
            Ok(mut entries) => entries.remove(&id),
            Err(_) => None,
        };
        match entry {
            Some(tx) => {
                // Receiver may have been dropped by a caller that gave up
                let _ = tx.send(resolution);
                true
            }
            None => {
                trace!(request_id = id, "Dropping response for unknown request");
                false
            }
        }
    }

    /// Forget a request without resolving it
    pub fn cancel(&self, id: u64) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => entries.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    /// Drop every entry so their receivers observe a disconnect
    pub fn clear(&self) -> usize {
        match self.entries.lock() {
            Ok(mut entries) => {
                let count = entries.len();
                entries.clear();
                count
            }
            Err(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
