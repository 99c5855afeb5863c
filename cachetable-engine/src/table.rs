//! Named, thread-safe key/value table with sliding per-item expiry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, trace, warn};

use cachetable_core::{CacheError, CacheKey, CacheValue, Result, SubscriptionId};

use crate::callbacks::{CallbackSnapshot, Callbacks};
use crate::config::TableConfig;
use crate::item::Item;
use crate::logger::Logger;
use crate::ranking;
use crate::scheduler::{Scheduler, Tick};

/// Produces an item for a key that is not in the table.
///
/// Receives the missing key and the extra arguments passed to
/// [`Table::value_with`]. Returning `None` declines the load.
pub type DataLoader<K, V> = Arc<dyn Fn(&K, &[&dyn Any]) -> Option<Item<K, V>> + Send + Sync>;

struct TableState<K, V> {
    items: HashMap<K, Arc<Item<K, V>>>,
    loader: Option<DataLoader<K, V>>,
    added_item: Callbacks<Item<K, V>>,
    about_to_delete: Callbacks<Item<K, V>>,
}

struct TableInner<K, V> {
    name: String,
    config: TableConfig,
    state: RwLock<TableState<K, V>>,
    logger: RwLock<Option<Logger>>,
    scheduler: Scheduler,
}

/// Handle to a cache table.
///
/// Cloning the handle is cheap and every clone refers to the same table.
/// Items expire once they have not been accessed for their life span; a
/// single timer fires a sweep at the earliest pending deadline, and the
/// sweep re-arms the timer for whatever remains. Dropping the last handle
/// stops the timer thread.
///
/// Callbacks never run while the table lock is held, so they are free to
/// call back into the table.
pub struct Table<K, V> {
    inner: Arc<TableInner<K, V>>,
}

impl<K, V> Clone for Table<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: CacheKey, V: CacheValue> Table<K, V> {
    /// Creates a table with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), TableConfig::default())
    }

    /// Creates a table with a custom configuration.
    pub fn with_config(name: impl Into<String>, config: TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(name.into(), config))
    }

    fn build(name: String, config: TableConfig) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<TableInner<K, V>>| {
            let weak = weak.clone();
            let tick: Tick = Arc::new(move || match weak.upgrade() {
                Some(inner) => {
                    Table { inner }.expiration_check();
                    true
                }
                None => false,
            });

            TableInner {
                scheduler: Scheduler::new(
                    config.sweep_thread_name(&name),
                    config.background_expiration,
                    tick,
                ),
                state: RwLock::new(TableState {
                    items: HashMap::with_capacity(config.initial_capacity),
                    loader: None,
                    added_item: Callbacks::new(),
                    about_to_delete: Callbacks::new(),
                }),
                logger: RwLock::new(None),
                name,
                config,
            }
        });
        Self { inner }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the configuration the table was built with.
    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    /// Returns how many items are stored.
    pub fn count(&self) -> usize {
        self.inner.state.read().items.len()
    }

    /// Returns whether `key` is stored. Does not touch the item.
    pub fn exists(&self, key: &K) -> bool {
        self.inner.state.read().items.contains_key(key)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSERTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Stores `data` under `key`, replacing any previous item.
    ///
    /// A zero `life_span` stores an item that never expires.
    pub fn add(&self, key: K, life_span: Duration, data: V) -> Arc<Item<K, V>> {
        self.add_item(Item::new(key, life_span, data))
    }

    /// Stores a prebuilt item under its own key.
    pub fn add_item(&self, item: Item<K, V>) -> Arc<Item<K, V>> {
        let item = Arc::new(item);
        let state = self.inner.state.write();
        self.insert(state, Arc::clone(&item));
        item
    }

    /// Stores `data` only if `key` is absent. Returns whether it was stored.
    pub fn not_found_add(&self, key: K, life_span: Duration, data: V) -> bool {
        self.get_or_add(key, life_span, move || data).1
    }

    /// Returns the item under `key`, creating it from `init` if absent.
    ///
    /// The flag is true when this call inserted the item. `init` runs under
    /// the table lock and must not touch the table. An existing item is not
    /// kept alive.
    pub fn get_or_add<F>(&self, key: K, life_span: Duration, init: F) -> (Arc<Item<K, V>>, bool)
    where
        F: FnOnce() -> V,
    {
        let state = self.inner.state.write();
        if let Some(existing) = state.items.get(&key) {
            return (Arc::clone(existing), false);
        }
        let item = Arc::new(Item::new(key, life_span, init()));
        self.insert(state, Arc::clone(&item));
        (item, true)
    }

    fn insert(&self, mut state: RwLockWriteGuard<'_, TableState<K, V>>, item: Arc<Item<K, V>>) {
        state.items.insert(item.key().clone(), Arc::clone(&item));
        let callbacks = state.added_item.snapshot();
        drop(state);

        self.log(|| {
            debug!(
                table = %self.inner.name,
                key = ?item.key(),
                life_span = ?item.life_span(),
                "Adding item to table"
            )
        });
        callbacks.invoke(&item);

        self.schedule_if_sooner(item.life_span());
    }

    fn schedule_if_sooner(&self, life_span: Duration) {
        if life_span.is_zero() {
            return;
        }
        let sooner = match self.inner.scheduler.remaining() {
            None => true,
            Some(remaining) => remaining.is_zero() || life_span < remaining,
        };
        if sooner {
            self.expiration_check();
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns the item under `key` and keeps it alive.
    ///
    /// On a miss the data loader, if any, is asked for the item; a loaded
    /// item is added to the table before it is returned.
    pub fn value(&self, key: &K) -> Result<Arc<Item<K, V>>> {
        self.value_with(key, &[])
    }

    /// Like [`value`](Self::value), passing `args` through to the data loader.
    pub fn value_with(&self, key: &K, args: &[&dyn Any]) -> Result<Arc<Item<K, V>>> {
        let (hit, loader) = {
            let state = self.inner.state.read();
            (state.items.get(key).cloned(), state.loader.clone())
        };

        if let Some(item) = hit {
            item.keep_alive();
            return Ok(item);
        }

        let loader = match loader {
            Some(loader) => loader,
            None => return Err(CacheError::KeyNotFound),
        };

        match loader(key, args) {
            Some(item) if item.key() != key => {
                self.log(|| {
                    warn!(
                        table = %self.inner.name,
                        requested = ?key,
                        loaded = ?item.key(),
                        "Data loader returned an item under another key"
                    )
                });
                Ok(self.add_item(item.rekey(key.clone())))
            }
            Some(item) => Ok(self.add_item(item)),
            None => {
                self.log(|| trace!(table = %self.inner.name, key = ?key, "Data loader declined key"));
                Err(CacheError::KeyNotFoundOrLoadable)
            }
        }
    }

    /// Returns the item under `key` without keeping it alive or loading it.
    pub fn peek(&self, key: &K) -> Option<Arc<Item<K, V>>> {
        self.inner.state.read().items.get(key).cloned()
    }

    /// Snapshot of every stored item.
    pub fn items(&self) -> Vec<Arc<Item<K, V>>> {
        self.inner.state.read().items.values().cloned().collect()
    }

    /// Visits every item present when the call started.
    ///
    /// The table is unlocked while `visit` runs.
    pub fn foreach<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &Arc<Item<K, V>>),
    {
        for item in self.items() {
            visit(item.key(), &item);
        }
    }

    /// Returns up to `count` items ordered by access count, highest first.
    pub fn most_accessed(&self, count: usize) -> Vec<Arc<Item<K, V>>> {
        ranking::most_accessed(self.items(), count)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REMOVAL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Removes the item under `key` and returns it.
    ///
    /// Runs the table's about-to-delete callbacks, then the item's own
    /// about-to-expire callbacks.
    pub fn delete(&self, key: &K) -> Result<Arc<Item<K, V>>> {
        let (item, callbacks) = {
            let mut state = self.inner.state.write();
            let item = state.items.remove(key).ok_or(CacheError::KeyNotFound)?;
            (item, state.about_to_delete.snapshot())
        };
        self.notify_removed(&item, &callbacks);
        Ok(item)
    }

    /// Removes every item and cancels the pending sweep.
    ///
    /// No delete or expire callbacks run.
    pub fn flush(&self) {
        let flushed = {
            let mut state = self.inner.state.write();
            self.inner.scheduler.cancel();
            std::mem::replace(
                &mut state.items,
                HashMap::with_capacity(self.inner.config.initial_capacity),
            )
        };
        self.log(|| info!(table = %self.inner.name, items = flushed.len(), "Flushing table"));
    }

    fn notify_removed(&self, item: &Arc<Item<K, V>>, callbacks: &CallbackSnapshot<Item<K, V>>) {
        self.log(|| {
            debug!(
                table = %self.inner.name,
                key = ?item.key(),
                age = ?item.created_on().elapsed(),
                hits = item.access_count(),
                "Deleting item from table"
            )
        });
        callbacks.invoke(item);
        item.expire_callbacks().invoke(item.key());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPIRATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Removes every overdue item and re-arms the timer for the next deadline.
    ///
    /// Runs automatically on the sweep thread; call it directly when
    /// background expiration is disabled.
    pub fn expiration_check(&self) {
        let (snapshot, previous) = {
            let state = self.inner.state.read();
            let previous = self.inner.scheduler.interval();
            self.inner.scheduler.cancel();
            (state.items.values().cloned().collect::<Vec<_>>(), previous)
        };

        if previous.is_zero() {
            self.log(|| debug!(table = %self.inner.name, "Expiration check installed"));
        } else {
            self.log(|| debug!(table = %self.inner.name, after = ?previous, "Expiration check triggered"));
        }

        let now = Instant::now();
        let mut smallest: Option<Duration> = None;
        for item in snapshot {
            let left = match item.time_to_expiry(now) {
                None => continue,
                Some(left) if left.is_zero() => match self.expire(&item) {
                    Some(left) => left,
                    None => continue,
                },
                Some(left) => left,
            };
            smallest = Some(smallest.map_or(left, |current| current.min(left)));
        }

        if let Some(interval) = smallest {
            let _state = self.inner.state.read();
            if let Err(err) = self.inner.scheduler.arm(interval) {
                self.log(|| warn!(table = %self.inner.name, error = %err, "Failed to start sweep thread"));
            }
        }
    }

    /// Removes `item` if it is still stored and still overdue.
    ///
    /// Returns the time left when a keep-alive or replacement raced the sweep.
    fn expire(&self, item: &Arc<Item<K, V>>) -> Option<Duration> {
        let callbacks = {
            let mut state = self.inner.state.write();
            match state.items.get(item.key()) {
                Some(current) if Arc::ptr_eq(current, item) => {}
                Some(current) => {
                    return current
                        .time_to_expiry(Instant::now())
                        .filter(|left| !left.is_zero());
                }
                None => return None,
            }
            if let Some(left) = item.time_to_expiry(Instant::now()) {
                if !left.is_zero() {
                    return Some(left);
                }
            }
            state.items.remove(item.key());
            state.about_to_delete.snapshot()
        };
        self.notify_removed(item, &callbacks);
        None
    }

    /// Interval the pending sweep was armed with, zero when none is pending.
    pub fn cleanup_interval(&self) -> Duration {
        self.inner.scheduler.interval()
    }

    /// Time until the pending sweep fires, `None` when none is pending.
    pub fn next_sweep_in(&self) -> Option<Duration> {
        self.inner.scheduler.remaining()
    }

    /// Stops the sweep thread for good.
    ///
    /// Items stay readable and writable but no longer expire on their own.
    pub fn shutdown(&self) {
        if self.inner.scheduler.is_shut_down() {
            return;
        }
        self.inner.scheduler.shutdown();
        self.log(|| debug!(table = %self.inner.name, "Expiration scheduler stopped"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CALLBACKS AND HOOKS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Installs the loader consulted on lookup misses, replacing any other.
    pub fn set_data_loader<F>(&self, loader: F)
    where
        F: Fn(&K, &[&dyn Any]) -> Option<Item<K, V>> + Send + Sync + 'static,
    {
        self.inner.state.write().loader = Some(Arc::new(loader));
    }

    /// Removes the data loader.
    pub fn remove_data_loader(&self) {
        self.inner.state.write().loader = None;
    }

    /// Replaces all "item added" callbacks with `f`.
    pub fn set_added_item_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&Item<K, V>) + Send + Sync + 'static,
    {
        self.inner.state.write().added_item.set(Arc::new(f))
    }

    /// Appends an "item added" callback.
    pub fn add_added_item_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&Item<K, V>) + Send + Sync + 'static,
    {
        self.inner.state.write().added_item.add(Arc::new(f))
    }

    /// Removes one "item added" callback.
    pub fn remove_added_item_callback(&self, id: SubscriptionId) -> bool {
        self.inner.state.write().added_item.remove(id)
    }

    /// Removes every "item added" callback.
    pub fn remove_added_item_callbacks(&self) {
        self.inner.state.write().added_item.clear();
    }

    /// Replaces all "item about to be deleted" callbacks with `f`.
    pub fn set_about_to_delete_item_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&Item<K, V>) + Send + Sync + 'static,
    {
        self.inner.state.write().about_to_delete.set(Arc::new(f))
    }

    /// Appends an "item about to be deleted" callback.
    pub fn add_about_to_delete_item_callback<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&Item<K, V>) + Send + Sync + 'static,
    {
        self.inner.state.write().about_to_delete.add(Arc::new(f))
    }

    /// Removes one "item about to be deleted" callback.
    pub fn remove_about_to_delete_item_callback(&self, id: SubscriptionId) -> bool {
        self.inner.state.write().about_to_delete.remove(id)
    }

    /// Removes every "item about to be deleted" callback.
    pub fn remove_about_to_delete_item_callbacks(&self) {
        self.inner.state.write().about_to_delete.clear();
    }

    /// Routes this table's log events to `logger`.
    pub fn set_logger(&self, logger: Logger) {
        *self.inner.logger.write() = Some(logger);
    }

    /// Silences this table.
    pub fn remove_logger(&self) {
        *self.inner.logger.write() = None;
    }

    fn log(&self, event: impl FnOnce()) {
        let logger = self.inner.logger.read().clone();
        if let Some(logger) = logger {
            logger.in_scope(event);
        }
    }
}

impl<K: CacheKey, V: CacheValue> fmt::Debug for Table<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.inner.name)
            .field("items", &self.count())
            .field("cleanup_interval", &self.cleanup_interval())
            .finish()
    }
}
