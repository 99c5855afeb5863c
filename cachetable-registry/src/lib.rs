//! # cachetable Registry
//!
//! An explicitly constructed, thread-safe map from table names to
//! [`Table`](cachetable_engine::Table) handles with get-or-create semantics.
//!
//! There is no process-wide registry: create one, share it (it is `Sync`),
//! and shut it down when finished.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use cachetable_registry::Registry;
//!
//! # fn main() -> cachetable_core::Result<()> {
//! let registry: Registry<String, u32> = Registry::new();
//!
//! let sessions = registry.table("sessions")?;
//! sessions.add("alice".to_string(), Duration::from_secs(30), 1);
//!
//! // The same name yields the same table.
//! assert_eq!(registry.table("sessions")?.count(), 1);
//!
//! registry.shutdown();
//! assert!(registry.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod registry;

pub use registry::Registry;
