//! `GrabLock` (§3, §5) — an in-memory, non-reentrant per-item lock
//! preventing two concurrent grab attempts for the same wanted item.
//!
//! Grounded in `core::circuit_breaker.rs`'s `Arc<Mutex<HashSet<..>>>`
//! guarded-state idiom, applied here to a try-acquire/release pair
//! instead of a three-state breaker.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct GrabLock {
    held: Mutex<HashSet<String>>,
}

/// RAII guard releasing the lock key on drop, so callers can't forget to
/// release on an early return.
pub struct GrabLockGuard<'a> {
    lock: &'a GrabLock,
    key: String,
}

impl Drop for GrabLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.lock().unwrap().remove(&self.key);
    }
}

impl GrabLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking acquire; `None` if already held.
    pub fn try_acquire(&self, key: &str) -> Option<GrabLockGuard<'_>> {
        let mut held = self.held.lock().unwrap();
        if held.contains(key) {
            return None;
        }
        held.insert(key.to_string());
        Some(GrabLockGuard { lock: self, key: key.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_held() {
        let lock = GrabLock::new();
        let guard = lock.try_acquire("movie:1").unwrap();
        assert!(lock.try_acquire("movie:1").is_none());
        drop(guard);
        assert!(lock.try_acquire("movie:1").is_some());
    }

    #[test]
    fn distinct_keys_do_not_contend() {
        let lock = GrabLock::new();
        let _a = lock.try_acquire("movie:1").unwrap();
        assert!(lock.try_acquire("movie:2").is_some());
    }
}
