//! A single cached entry.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cachetable_core::SubscriptionId;

use crate::callbacks::{CallbackSnapshot, Callbacks};

/// Mutable part of an item, guarded by the item lock.
struct ItemState<K, V> {
    data: V,
    accessed_on: Instant,
    access_count: u64,
    about_to_expire: Callbacks<K>,
}

/// One key/value entry with a sliding time-to-live.
///
/// The key, life span, and creation time never change. The value, the
/// last-access time, the access counter, and the expiry callbacks sit behind
/// a per-item reader/writer lock so keep-alives, expiration sweeps, and
/// composite value updates never race.
pub struct Item<K, V> {
    key: K,
    life_span: Duration,
    created_on: Instant,
    state: RwLock<ItemState<K, V>>,
}

impl<K, V> Item<K, V> {
    /// Creates an item that expires after `life_span` without access.
    ///
    /// A zero life span means the item never expires.
    pub fn new(key: K, life_span: Duration, data: V) -> Self {
        let now = Instant::now();
        Self {
            key,
            life_span,
            created_on: now,
            state: RwLock::new(ItemState {
                data,
                accessed_on: now,
                access_count: 0,
                about_to_expire: Callbacks::new(),
            }),
        }
    }

    /// Rebuilds the item under `key` as a fresh entry with the same life span
    /// and value.
    pub(crate) fn rekey(self, key: K) -> Self {
        Self::new(key, self.life_span, self.state.into_inner().data)
    }

    /// Marks the item as used: resets its expiry window and bumps the counter.
    pub fn keep_alive(&self) {
        let mut state = self.state.write();
        state.accessed_on = Instant::now();
        state.access_count += 1;
    }

    /// Returns the item's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the configured life span (zero = never expires).
    pub fn life_span(&self) -> Duration {
        self.life_span
    }

    /// Returns when the item was created.
    pub fn created_on(&self) -> Instant {
        self.created_on
    }

    /// Returns when the item was last kept alive.
    pub fn accessed_on(&self) -> Instant {
        self.state.read().accessed_on
    }

    /// Returns how many times the item was kept alive.
    pub fn access_count(&self) -> u64 {
        self.state.read().access_count
    }

    /// Borrows the value under the item's read lock.
    ///
    /// Keep-alives on this item block while the guard is held.
    pub fn data(&self) -> MappedRwLockReadGuard<'_, V> {
        RwLockReadGuard::map(self.state.read(), |state| &state.data)
    }

    /// Borrows the value mutably under the item's write lock.
    pub fn data_mut(&self) -> MappedRwLockWriteGuard<'_, V> {
        RwLockWriteGuard::map(self.state.write(), |state| &mut state.data)
    }

    /// Returns a clone of the value.
    pub fn cloned_data(&self) -> V
    where
        V: Clone,
    {
        self.state.read().data.clone()
    }

    /// Time left before expiry as seen at `now`.
    ///
    /// `None` for items that never expire, `Some(Duration::ZERO)` once the
    /// item is overdue. Reads the access time under the item lock, so a
    /// keep-alive that landed after `now` was taken counts as fresh.
    pub fn time_to_expiry(&self, now: Instant) -> Option<Duration> {
        if self.life_span.is_zero() {
            return None;
        }
        let accessed_on = self.state.read().accessed_on;
        let elapsed = now.saturating_duration_since(accessed_on);
        Some(self.life_span.saturating_sub(elapsed))
    }

    /// Returns true if the item has outlived its life span right now.
    pub fn is_expired(&self) -> bool {
        self.time_to_expiry(Instant::now())
            .is_some_and(|left| left.is_zero())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPIRY CALLBACKS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replaces all expiry callbacks with `f`.
    pub fn set_about_to_expire_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&K) + Send + Sync + 'static,
    {
        self.state.write().about_to_expire.set(Arc::new(f))
    }

    /// Appends `f` to the callbacks run right before the item leaves its table.
    pub fn add_about_to_expire_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&K) + Send + Sync + 'static,
    {
        self.state.write().about_to_expire.add(Arc::new(f))
    }

    /// Removes one expiry callback. Returns false if `id` was not registered.
    pub fn remove_about_to_expire_callback(&self, id: SubscriptionId) -> bool {
        self.state.write().about_to_expire.remove(id)
    }

    /// Removes every expiry callback.
    pub fn remove_about_to_expire_callbacks(&self) {
        self.state.write().about_to_expire.clear();
    }

    pub(crate) fn expire_callbacks(&self) -> CallbackSnapshot<K> {
        self.state.read().about_to_expire.snapshot()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Item<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("life_span", &self.life_span)
            .field("access_count", &state.access_count)
            .field("expire_callbacks", &state.about_to_expire.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_new_item() {
        let item = Item::new("k", Duration::from_secs(1), 42);
        assert_eq!(*item.key(), "k");
        assert_eq!(item.life_span(), Duration::from_secs(1));
        assert_eq!(item.access_count(), 0);
        assert_eq!(item.accessed_on(), item.created_on());
        assert_eq!(*item.data(), 42);
    }

    #[test]
    fn test_keep_alive_updates_access() {
        let item = Item::new("k", Duration::from_secs(1), ());
        thread::sleep(Duration::from_millis(2));

        item.keep_alive();
        item.keep_alive();

        assert_eq!(item.access_count(), 2);
        assert!(item.accessed_on() > item.created_on());
    }

    #[test]
    fn test_never_expires() {
        let item = Item::new("k", Duration::ZERO, ());
        assert_eq!(item.time_to_expiry(Instant::now() + Duration::from_secs(3600)), None);
        assert!(!item.is_expired());
    }

    #[test]
    fn test_time_to_expiry() {
        let item = Item::new("k", Duration::from_millis(100), ());
        let created = item.created_on();

        assert_eq!(
            item.time_to_expiry(created + Duration::from_millis(40)),
            Some(Duration::from_millis(60))
        );
        assert_eq!(
            item.time_to_expiry(created + Duration::from_millis(100)),
            Some(Duration::ZERO)
        );
        assert_eq!(
            item.time_to_expiry(created + Duration::from_millis(500)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_keep_alive_after_snapshot_counts_as_fresh() {
        let item = Item::new("k", Duration::from_millis(10), ());
        let stale_now = Instant::now();
        thread::sleep(Duration::from_millis(20));
        item.keep_alive();

        // An access newer than `now` saturates to zero elapsed time.
        assert_eq!(item.time_to_expiry(stale_now), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_data_mut() {
        let item = Item::new("k", Duration::ZERO, vec![1]);
        item.data_mut().push(2);
        assert_eq!(item.cloned_data(), vec![1, 2]);
    }

    #[test]
    fn test_expire_callbacks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let item = Item::new("k".to_string(), Duration::ZERO, ());

        let h = Arc::clone(&hits);
        let first = item.add_about_to_expire_callback(move |key: &String| {
            assert_eq!(key, "k");
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = Arc::clone(&hits);
        item.add_about_to_expire_callback(move |_| {
            h.fetch_add(10, Ordering::SeqCst);
        });

        item.expire_callbacks().invoke(item.key());
        assert_eq!(hits.load(Ordering::SeqCst), 11);

        assert!(item.remove_about_to_expire_callback(first));
        item.expire_callbacks().invoke(item.key());
        assert_eq!(hits.load(Ordering::SeqCst), 21);

        item.remove_about_to_expire_callbacks();
        assert!(item.expire_callbacks().is_empty());
    }

    #[test]
    fn test_set_expire_callback_replaces() {
        let hits = Arc::new(AtomicUsize::new(0));
        let item = Item::new(1u32, Duration::ZERO, ());

        let h = Arc::clone(&hits);
        item.add_about_to_expire_callback(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = Arc::clone(&hits);
        item.set_about_to_expire_callback(move |_| {
            h.fetch_add(100, Ordering::SeqCst);
        });

        item.expire_callbacks().invoke(item.key());
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_concurrent_keep_alive_counts_every_access() {
        let item = Arc::new(Item::new("k", Duration::from_secs(1), ()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let item = Arc::clone(&item);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        item.keep_alive();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(item.access_count(), 8000);
    }
}
