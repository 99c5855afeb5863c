//! Error types for cachetable.
//!
//! Every failure a table or adapter can report is a variant of
//! [`CacheError`]. None of them are fatal: they are returned to the caller,
//! which decides whether to retry, load, or give up.

use thiserror::Error;

use crate::types::ValueKind;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Main error type for all cachetable operations.
#[derive(Debug, Error)]
pub enum CacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The key is not present and no data loader is configured.
    #[error("Key not found in cache")]
    KeyNotFound,

    /// The key is not present and the data loader declined to produce it.
    #[error("Key not found and could not be loaded into cache")]
    KeyNotFoundOrLoadable,

    // ═══════════════════════════════════════════════════════════════════════════
    // COMPOSITE VALUE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A composite operation hit a payload of another kind.
    #[error("Key holds a {found} value, expected {expected}")]
    TypeMismatch {
        /// Kind the operation requires.
        expected: ValueKind,
        /// Kind actually stored under the key.
        found: ValueKind,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration values failed validation.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CacheError {
    /// Returns true if the key was absent (with or without a loader).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CacheError::KeyNotFound | CacheError::KeyNotFoundOrLoadable
        )
    }

    /// Returns true if a composite operation was applied to the wrong kind.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CacheError::TypeMismatch { .. })
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CacheError::ConfigError(_) | CacheError::JsonError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CacheError::KeyNotFound.to_string(), "Key not found in cache");

        let err = CacheError::TypeMismatch {
            expected: ValueKind::List,
            found: ValueKind::Hash,
        };
        assert!(err.to_string().contains("list"));
        assert!(err.to_string().contains("hash"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CacheError::KeyNotFound.is_not_found());
        assert!(CacheError::KeyNotFoundOrLoadable.is_not_found());
        assert!(!CacheError::ConfigError("x".into()).is_not_found());

        let mismatch = CacheError::TypeMismatch {
            expected: ValueKind::Set,
            found: ValueKind::Scalar,
        };
        assert!(mismatch.is_type_mismatch());
        assert!(!mismatch.is_not_found());

        assert!(CacheError::ConfigError("bad".into()).is_config_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let result: Result<serde_json::Value> = json_result.map_err(CacheError::from);
        assert!(matches!(result, Err(CacheError::JsonError(_))));
        assert!(result.unwrap_err().is_config_error());
    }
}
