//! Optional TTL memoization for whole optimization results.
//!
//! Not part of algorithmic correctness: a cache miss just recomputes. Keys
//! are SHA-256 digests over the canonical request shape so unrelated field
//! values can never collide into the same key by concatenation accidents.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

/// Builds a stable cache key from the ordered request parts. Parts are
/// NUL-separated before hashing.
#[must_use]
pub fn request_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// In-memory TTL cache. Expired entries are dropped lazily on access.
pub struct MemoCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, T)>>,
}

impl<T: Clone> MemoCache<T> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if present and not expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, value: T) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), (Instant::now(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_what_was_set() {
        let cache = MemoCache::new(Duration::from_secs(60));
        cache.set("k", 7);
        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn missing_key_is_none() {
        let cache: MemoCache<i32> = MemoCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entry_is_dropped() {
        let cache = MemoCache::new(Duration::ZERO);
        cache.set("k", 7);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn set_replaces_previous_value() {
        let cache = MemoCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn request_key_is_stable_and_order_sensitive() {
        let a = request_key(&["mælk", "æg"]);
        let b = request_key(&["mælk", "æg"]);
        let c = request_key(&["æg", "mælk"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn request_key_separates_adjacent_parts() {
        // "ab" + "c" must not collide with "a" + "bc".
        assert_ne!(request_key(&["ab", "c"]), request_key(&["a", "bc"]));
    }
}
