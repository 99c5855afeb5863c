//! Hash commands.

use std::collections::HashMap;
use std::time::Duration;

use cachetable_core::{CacheError, CacheKey, CacheValue, Result, Value};
use cachetable_engine::Table;

use crate::existing;

/// Field/value map commands.
pub trait HashTable<K, T> {
    /// Sets `field` in the hash under `key`, creating the hash with
    /// `life_span` if absent. Returns the previous value of the field.
    fn hset(&self, key: K, life_span: Duration, field: &str, value: T) -> Result<Option<T>>;

    /// Returns a copy of `field` and keeps the hash alive.
    ///
    /// Fails with `KeyNotFound` if either the key or the field is missing.
    fn hget(&self, key: &K, field: &str) -> Result<T>
    where
        T: Clone;

    /// Removes `field` and returns its value.
    fn hdel(&self, key: &K, field: &str) -> Result<Option<T>>;

    /// Returns the number of fields.
    fn hlen(&self, key: &K) -> Result<usize>;

    /// Returns whether `field` is set.
    fn hexists(&self, key: &K, field: &str) -> Result<bool>;
}

impl<K: CacheKey, T: CacheValue> HashTable<K, T> for Table<K, Value<T>> {
    fn hset(&self, key: K, life_span: Duration, field: &str, value: T) -> Result<Option<T>> {
        let mut pending = Some(value);
        let (item, _) = self.get_or_add(key, life_span, || {
            Value::Hash(
                pending
                    .take()
                    .map(|value| (field.to_string(), value))
                    .into_iter()
                    .collect::<HashMap<String, T>>(),
            )
        });

        let mut data = item.data_mut();
        let hash = data.as_hash_mut()?;
        Ok(match pending {
            Some(value) => hash.insert(field.to_string(), value),
            None => None,
        })
    }

    fn hget(&self, key: &K, field: &str) -> Result<T>
    where
        T: Clone,
    {
        let item = existing(self, key)?;
        let value = {
            let data = item.data();
            data.as_hash()?.get(field).cloned().ok_or(CacheError::KeyNotFound)?
        };
        item.keep_alive();
        Ok(value)
    }

    fn hdel(&self, key: &K, field: &str) -> Result<Option<T>> {
        let item = existing(self, key)?;
        let mut data = item.data_mut();
        Ok(data.as_hash_mut()?.remove(field))
    }

    fn hlen(&self, key: &K) -> Result<usize> {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_hash()?.len())
    }

    fn hexists(&self, key: &K, field: &str) -> Result<bool> {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_hash()?.contains_key(field))
    }
}
