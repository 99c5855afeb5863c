//! Common traits for cachetable.
//!
//! Tables are generic over their key and value types. These marker traits
//! name the bounds once so every crate can spell them the same way.

use std::fmt::Debug;
use std::hash::Hash;

/// Bounds required of a table key.
///
/// Keys are hashed into the item map, cloned into callbacks and the sweep
/// snapshot, and formatted into log events.
pub trait CacheKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Bounds required of a table value.
///
/// Values are shared between threads behind the item lock.
pub trait CacheValue: Send + Sync + 'static {}

impl<T> CacheValue for T where T: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_key<K: CacheKey>() {}
    fn assert_value<V: CacheValue>() {}

    #[test]
    fn test_common_types_satisfy_bounds() {
        assert_key::<String>();
        assert_key::<u64>();
        assert_key::<(u32, &'static str)>();
        assert_value::<Vec<u8>>();
        assert_value::<crate::types::Value<String>>();
    }
}
