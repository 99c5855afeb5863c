//! Set commands.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

use cachetable_core::{CacheError, CacheKey, CacheValue, Result, Value};
use cachetable_engine::Table;

use crate::existing;

/// Unordered set commands.
pub trait SetTable<K, T> {
    /// Adds `member` to the set under `key`, creating the set with
    /// `life_span` if absent. Returns true if the member was new.
    fn sadd(&self, key: K, life_span: Duration, member: T) -> Result<bool>;

    /// Returns whether `member` is in the set. An absent key is an empty set.
    fn sismember(&self, key: &K, member: &T) -> Result<bool>;

    /// Removes `member`. Returns true if it was present.
    fn srem(&self, key: &K, member: &T) -> Result<bool>;

    /// Returns the number of members.
    fn scard(&self, key: &K) -> Result<usize>;

    /// Returns a copy of the members in no particular order.
    fn smembers(&self, key: &K) -> Result<Vec<T>>
    where
        T: Clone;
}

impl<K, T> SetTable<K, T> for Table<K, Value<T>>
where
    K: CacheKey,
    T: CacheValue + Eq + Hash,
{
    fn sadd(&self, key: K, life_span: Duration, member: T) -> Result<bool> {
        let mut pending = Some(member);
        let (item, _) = self.get_or_add(key, life_span, || {
            Value::Set(pending.take().into_iter().collect::<HashSet<T>>())
        });

        let mut data = item.data_mut();
        let set = data.as_set_mut()?;
        Ok(match pending {
            Some(member) => set.insert(member),
            None => true,
        })
    }

    fn sismember(&self, key: &K, member: &T) -> Result<bool> {
        let item = match existing(self, key) {
            Ok(item) => item,
            Err(CacheError::KeyNotFound) => return Ok(false),
            Err(err) => return Err(err),
        };
        let data = item.data();
        Ok(data.as_set()?.contains(member))
    }

    fn srem(&self, key: &K, member: &T) -> Result<bool> {
        let item = existing(self, key)?;
        let mut data = item.data_mut();
        Ok(data.as_set_mut()?.remove(member))
    }

    fn scard(&self, key: &K) -> Result<usize> {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_set()?.len())
    }

    fn smembers(&self, key: &K) -> Result<Vec<T>>
    where
        T: Clone,
    {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_set()?.iter().cloned().collect())
    }
}
