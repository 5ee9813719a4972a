//! Program cache for resolved ciphers
//!
//! Player script versions rotate infrequently, so a recovered program is
//! reused for every signature belonging to the same script URL. The cache is
//! an explicit object owned by the session rather than a process-wide
//! singleton, so tests and independent sessions get isolated instances.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

use crate::cipher::Cipher;

/// Bounded cache of descrambling programs keyed by script URL
///
/// Insertions beyond capacity evict the stalest entry. Concurrent resolutions
/// of the same URL may both insert; the overwrite is harmless because the
/// decompiled program for a given URL is invariant (last-write-wins).
pub struct CipherCache {
    inner: Mutex<LruCache<String, Arc<Cipher>>>,
}

impl CipherCache {
    /// Default number of cached programs
    pub const DEFAULT_CAPACITY: usize = 50;

    /// Creates a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` programs (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached program for a script URL, if any
    pub fn get(&self, url: &str) -> Option<Arc<Cipher>> {
        self.lock().get(url).cloned()
    }

    /// Stores a resolved program and returns a shared handle to it
    pub fn insert(&self, url: String, cipher: Cipher) -> Arc<Cipher> {
        let cipher = Arc::new(cipher);
        self.lock().put(url, Arc::clone(&cipher));
        cipher
    }

    /// Number of programs currently cached
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no program is cached
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of cached programs
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Cipher>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself stays usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CipherCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::TransformOp;

    fn program(n: usize) -> Cipher {
        Cipher::from_ops(vec![TransformOp::Swap(n)])
    }

    #[test]
    fn test_insert_and_get() {
        let cache = CipherCache::new();
        cache.insert("https://example.com/base.js".to_string(), program(1));
        assert!(cache.get("https://example.com/base.js").is_some());
        assert!(cache.get("https://example.com/other.js").is_none());
    }

    #[test]
    fn test_default_capacity() {
        let cache = CipherCache::new();
        assert_eq!(cache.capacity(), 50);
    }

    #[test]
    fn test_eviction_drops_exactly_the_oldest() {
        let cache = CipherCache::new();
        for i in 0..51 {
            cache.insert(format!("https://example.com/player{i}/base.js"), program(i));
        }

        assert_eq!(cache.len(), 50);
        assert!(cache.get("https://example.com/player0/base.js").is_none());
        for i in 1..51 {
            assert!(
                cache.get(&format!("https://example.com/player{i}/base.js")).is_some(),
                "entry {i} should survive"
            );
        }
    }

    #[test]
    fn test_reinsert_overwrites() {
        let cache = CipherCache::with_capacity(2);
        cache.insert("a".to_string(), program(1));
        cache.insert("a".to_string(), program(2));
        assert_eq!(cache.len(), 1);
        let cached = cache.get("a").unwrap();
        assert_eq!(cached.decode("xy"), program(2).decode("xy"));
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let cache = CipherCache::with_capacity(0);
        cache.insert("a".to_string(), program(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_shared_handle_survives_eviction() {
        let cache = CipherCache::with_capacity(1);
        let handle = cache.insert("a".to_string(), program(3));
        cache.insert("b".to_string(), program(4));
        assert!(cache.get("a").is_none());
        // The Arc handed out earlier keeps the program alive
        // swap(0, 3 % 3) leaves the buffer unchanged
        assert_eq!(handle.decode("abc"), "abc");
    }
}
