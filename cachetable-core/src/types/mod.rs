//! Domain types for cachetable.
//!
//! - [`Value`]: tagged payload (scalar, list, set, hash) for composite adapters
//! - [`ValueKind`]: the discriminant checked at the adapter boundary
//! - [`SubscriptionId`]: token identifying one registered callback

mod subscription;
mod value;

pub use subscription::*;
pub use value::*;
