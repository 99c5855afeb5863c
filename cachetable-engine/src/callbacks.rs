//! Ordered callback queues.
//!
//! Tables keep two queues ("item added", "item about to be deleted") and
//! every item keeps one ("about to expire"). A queue is only ever touched
//! under its owner's lock; invocation works on a [`CallbackSnapshot`] taken
//! under that lock and run after it has been released.

use std::fmt;
use std::sync::Arc;

use cachetable_core::SubscriptionId;

/// A shared callback receiving a borrowed argument.
pub type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Registration-ordered queue of callbacks.
pub(crate) struct Callbacks<A: ?Sized> {
    entries: Vec<(SubscriptionId, Callback<A>)>,
}

impl<A: ?Sized> Callbacks<A> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a callback and returns its token.
    pub(crate) fn add(&mut self, callback: Callback<A>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries.push((id, callback));
        id
    }

    /// Replaces every queued callback with `callback`.
    pub(crate) fn set(&mut self, callback: Callback<A>) -> SubscriptionId {
        self.clear();
        self.add(callback)
    }

    /// Removes the callback registered under `id`.
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copies the queue so it can be invoked after the owner's lock is released.
    pub(crate) fn snapshot(&self) -> CallbackSnapshot<A> {
        CallbackSnapshot {
            callbacks: self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
        }
    }
}

impl<A: ?Sized> Default for Callbacks<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Callbacks<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

/// Callbacks copied out of a queue, ready to run lock-free.
pub(crate) struct CallbackSnapshot<A: ?Sized> {
    callbacks: Vec<Callback<A>>,
}

impl<A: ?Sized> CallbackSnapshot<A> {
    /// Runs every callback in registration order.
    ///
    /// A panicking callback unwinds into the caller; the remaining
    /// callbacks are skipped.
    pub(crate) fn invoke(&self, arg: &A) {
        for callback in &self.callbacks {
            callback(arg);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Callback<str> {
        let log = Arc::clone(log);
        Arc::new(move |arg: &str| log.lock().push(format!("{tag}:{arg}")))
    }

    #[test]
    fn test_invoke_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue: Callbacks<str> = Callbacks::new();
        queue.add(recorder(&log, "a"));
        queue.add(recorder(&log, "b"));
        queue.add(recorder(&log, "c"));

        queue.snapshot().invoke("k");

        assert_eq!(*log.lock(), vec!["a:k", "b:k", "c:k"]);
    }

    #[test]
    fn test_set_replaces_queue() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue: Callbacks<str> = Callbacks::new();
        queue.add(recorder(&log, "a"));
        queue.add(recorder(&log, "b"));
        queue.set(recorder(&log, "c"));

        assert_eq!(queue.len(), 1);
        queue.snapshot().invoke("k");
        assert_eq!(*log.lock(), vec!["c:k"]);
    }

    #[test]
    fn test_remove_only_that_subscriber() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue: Callbacks<str> = Callbacks::new();
        let a = queue.add(recorder(&log, "a"));
        queue.add(recorder(&log, "b"));

        assert!(queue.remove(a));
        assert!(!queue.remove(a));

        queue.snapshot().invoke("k");
        assert_eq!(*log.lock(), vec!["b:k"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue: Callbacks<str> = Callbacks::new();
        queue.add(recorder(&log, "a"));

        let snapshot = queue.snapshot();
        queue.clear();

        assert!(!snapshot.is_empty());
        snapshot.invoke("k");
        assert_eq!(*log.lock(), vec!["a:k"]);
        assert!(queue.snapshot().is_empty());
    }

    proptest! {
        /// Removing a subset of tokens leaves exactly the others, in order.
        #[test]
        fn prop_remove_keeps_order(mask in prop::collection::vec(any::<bool>(), 0..32)) {
            let mut queue: Callbacks<str> = Callbacks::new();
            let ids: Vec<_> = mask.iter().map(|_| queue.add(Arc::new(|_: &str| {}))).collect();

            for (id, remove) in ids.iter().zip(&mask) {
                if *remove {
                    prop_assert!(queue.remove(*id));
                }
            }

            let kept: Vec<_> = ids.iter().zip(&mask).filter(|(_, r)| !**r).map(|(id, _)| *id).collect();
            let remaining: Vec<_> = queue.entries.iter().map(|(id, _)| *id).collect();
            prop_assert_eq!(remaining, kept);
        }
    }
}
