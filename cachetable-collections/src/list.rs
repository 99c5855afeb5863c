//! List commands.

use std::collections::VecDeque;
use std::time::Duration;

use cachetable_core::{CacheKey, CacheValue, Result, Value};
use cachetable_engine::Table;

use crate::existing;

/// Double-ended list commands.
pub trait ListTable<K, T> {
    /// Pushes `value` at the head of the list under `key`, creating the list
    /// with `life_span` if absent. Returns the new length.
    fn lpush(&self, key: K, life_span: Duration, value: T) -> Result<usize>;

    /// Pushes `value` at the tail. See [`lpush`](Self::lpush).
    fn rpush(&self, key: K, life_span: Duration, value: T) -> Result<usize>;

    /// Removes and returns the head element, `None` if the list is empty.
    fn lpop(&self, key: &K) -> Result<Option<T>>;

    /// Removes and returns the tail element, `None` if the list is empty.
    fn rpop(&self, key: &K) -> Result<Option<T>>;

    /// Returns the list length.
    fn llen(&self, key: &K) -> Result<usize>;

    /// Returns a copy of the list, head first.
    fn lrange(&self, key: &K) -> Result<Vec<T>>
    where
        T: Clone;
}

#[derive(Clone, Copy)]
enum End {
    Head,
    Tail,
}

fn push<K: CacheKey, T: CacheValue>(
    table: &Table<K, Value<T>>,
    end: End,
    key: K,
    life_span: Duration,
    value: T,
) -> Result<usize> {
    let mut pending = Some(value);
    let (item, _) = table.get_or_add(key, life_span, || {
        Value::List(pending.take().into_iter().collect::<VecDeque<T>>())
    });

    let mut data = item.data_mut();
    let list = data.as_list_mut()?;
    if let Some(value) = pending {
        match end {
            End::Head => list.push_front(value),
            End::Tail => list.push_back(value),
        }
    }
    Ok(list.len())
}

fn pop<K: CacheKey, T: CacheValue>(table: &Table<K, Value<T>>, end: End, key: &K) -> Result<Option<T>> {
    let item = existing(table, key)?;
    let mut data = item.data_mut();
    let list = data.as_list_mut()?;
    Ok(match end {
        End::Head => list.pop_front(),
        End::Tail => list.pop_back(),
    })
}

impl<K: CacheKey, T: CacheValue> ListTable<K, T> for Table<K, Value<T>> {
    fn lpush(&self, key: K, life_span: Duration, value: T) -> Result<usize> {
        push(self, End::Head, key, life_span, value)
    }

    fn rpush(&self, key: K, life_span: Duration, value: T) -> Result<usize> {
        push(self, End::Tail, key, life_span, value)
    }

    fn lpop(&self, key: &K) -> Result<Option<T>> {
        pop(self, End::Head, key)
    }

    fn rpop(&self, key: &K) -> Result<Option<T>> {
        pop(self, End::Tail, key)
    }

    fn llen(&self, key: &K) -> Result<usize> {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_list()?.len())
    }

    fn lrange(&self, key: &K) -> Result<Vec<T>>
    where
        T: Clone,
    {
        let item = existing(self, key)?;
        let data = item.data();
        Ok(data.as_list()?.iter().cloned().collect())
    }
}
