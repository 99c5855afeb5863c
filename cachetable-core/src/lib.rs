//! # cachetable Core
//!
//! Core types, errors, and traits shared by every cachetable crate.
//!
//! This crate provides the foundational building blocks:
//!
//! - **Types**: the tagged [`Value`] payload used by composite adapters and
//!   the [`SubscriptionId`] token handed out by callback queues
//! - **Errors**: the [`CacheError`] taxonomy returned at the API boundary
//! - **Constants**: defaults for table configuration and scheduling
//! - **Traits**: the [`CacheKey`] and [`CacheValue`] bounds required by tables
//!
//! ## Example
//!
//! ```rust
//! use cachetable_core::{CacheError, Value, ValueKind};
//!
//! let value: Value<u32> = Value::list();
//! assert_eq!(value.kind(), ValueKind::List);
//!
//! let err = value.expect_kind(ValueKind::Set).unwrap_err();
//! assert!(err.is_type_mismatch());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
