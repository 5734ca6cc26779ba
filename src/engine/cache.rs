// In-memory payload cache for a session: resource id -> loaded payload.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::outcome::Payload;

#[derive(Default)]
pub struct PayloadCache {
    entries: RwLock<HashMap<String, Payload>>,
    cached_bytes: AtomicU64,
}

impl PayloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload. Returns false and keeps the existing entry if `id` is already cached.
    pub fn put(&self, id: &str, payload: Payload) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(id) {
            return false;
        }
        self.cached_bytes
            .fetch_add(payload.byte_len(), Ordering::Relaxed);
        entries.insert(id.to_string(), payload);
        true
    }

    pub fn get(&self, id: &str) -> Option<Payload> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.cached_bytes.store(0, Ordering::Relaxed);
    }

    pub fn cached_bytes(&self) -> u64 {
        self.cached_bytes.load(Ordering::Relaxed)
    }
}
