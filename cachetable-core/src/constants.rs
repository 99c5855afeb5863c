//! Shared constants for cachetable.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// LIFESPAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Life span of an item that never expires.
///
/// Items added with this life span are skipped by every expiration sweep.
pub const NEVER_EXPIRE: Duration = Duration::ZERO;

// ═══════════════════════════════════════════════════════════════════════════════
// TABLE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default number of items a table pre-allocates room for.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Prefix of the background sweep thread name; the table name is appended.
pub const SWEEP_THREAD_PREFIX: &str = "cachetable-sweep";
