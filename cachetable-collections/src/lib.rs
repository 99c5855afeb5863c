//! # cachetable Collections
//!
//! Redis-style list, set, and hash commands over a
//! [`Table`](cachetable_engine::Table) whose values are
//! [`Value`](cachetable_core::Value)s.
//!
//! A key created by one of these commands holds the matching container and
//! expires like any other item. Each command checks the stored
//! [`ValueKind`](cachetable_core::ValueKind) first and fails with
//! `TypeMismatch` when the key holds something else. Container updates run
//! under the item's write lock, so concurrent pushes and pops on the same
//! key never interleave.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use cachetable_core::Value;
//! use cachetable_engine::Table;
//! use cachetable_collections::{HashTable, ListTable, SetTable};
//!
//! let table: Table<String, Value<u32>> = Table::new("collections");
//! let ttl = Duration::from_secs(60);
//!
//! table.rpush("queue".into(), ttl, 1).unwrap();
//! table.rpush("queue".into(), ttl, 2).unwrap();
//! assert_eq!(table.lpop(&"queue".into()).unwrap(), Some(1));
//!
//! assert!(table.sadd("seen".into(), ttl, 7).unwrap());
//! assert!(table.sismember(&"seen".into(), &7).unwrap());
//!
//! table.hset("user".into(), ttl, "age", 30).unwrap();
//! assert_eq!(table.hget(&"user".into(), "age").unwrap(), 30);
//!
//! // Commands never reinterpret another kind.
//! assert!(table.llen(&"seen".into()).unwrap_err().is_type_mismatch());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod hash;
mod list;
mod set;

pub use hash::HashTable;
pub use list::ListTable;
pub use set::SetTable;

use std::sync::Arc;

use cachetable_core::{CacheError, CacheKey, CacheValue, Result, Value};
use cachetable_engine::{Item, Table};

/// Looks `key` up without keeping it alive.
fn existing<K: CacheKey, T: CacheValue>(
    table: &Table<K, Value<T>>,
    key: &K,
) -> Result<Arc<Item<K, Value<T>>>> {
    table.peek(key).ok_or(CacheError::KeyNotFound)
}
