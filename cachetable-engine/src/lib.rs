//! # cachetable Engine
//!
//! Named, thread-safe in-memory tables whose items expire after a
//! configurable period without access.
//!
//! - [`Table`]: the table handle with add/lookup/delete, callbacks, a data
//!   loader for misses, and a self-rescheduling expiration timer
//! - [`Item`]: one entry with its sliding life span and expiry callbacks
//! - [`TableConfig`]: serde-backed table settings
//! - [`Logger`]: per-table `tracing` sink
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use cachetable_engine::Table;
//!
//! let table: Table<String, u32> = Table::new("example");
//! table.add("answer".to_string(), Duration::from_secs(5), 42);
//!
//! let item = table.value(&"answer".to_string()).unwrap();
//! assert_eq!(*item.data(), 42);
//! assert_eq!(item.access_count(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod callbacks;
mod config;
mod item;
mod logger;
mod ranking;
mod scheduler;
mod table;

pub use callbacks::Callback;
pub use config::TableConfig;
pub use item::Item;
pub use logger::Logger;
pub use table::{DataLoader, Table};

pub use cachetable_core::{CacheError, Result, SubscriptionId, NEVER_EXPIRE};
