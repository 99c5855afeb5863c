//! Table configuration.

use serde::{Deserialize, Serialize};

use cachetable_core::{CacheError, Result, DEFAULT_INITIAL_CAPACITY, SWEEP_THREAD_PREFIX};

/// Table configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Capacity reserved for the item map up front
    pub initial_capacity: usize,
    /// Whether a background thread fires expiration sweeps.
    ///
    /// When disabled, deadlines are still tracked but sweeps only run from
    /// adds with a sooner deadline or an explicit `expiration_check` call.
    pub background_expiration: bool,
    /// Name for the sweep thread (defaults to `cachetable-sweep-<table>`)
    pub thread_name: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            background_expiration: true,
            thread_name: None,
        }
    }
}

impl TableConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON and validates it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the initial item map capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Disables the background sweep thread.
    pub fn without_background_expiration(mut self) -> Self {
        self.background_expiration = false;
        self
    }

    /// Names the sweep thread.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.thread_name {
            if name.trim().is_empty() {
                return Err(CacheError::ConfigError(
                    "thread_name must not be empty".into(),
                ));
            }
            if name.contains('\0') {
                return Err(CacheError::ConfigError(
                    "thread_name must not contain NUL bytes".into(),
                ));
            }
        }
        Ok(())
    }

    /// Resolves the sweep thread name for the table `table`.
    pub(crate) fn sweep_thread_name(&self, table: &str) -> String {
        match &self.thread_name {
            Some(name) => name.clone(),
            None => format!("{SWEEP_THREAD_PREFIX}-{}", table.replace('\0', "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert!(config.background_expiration);
        assert!(config.thread_name.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TableConfig::new()
            .with_initial_capacity(8)
            .without_background_expiration()
            .with_thread_name("sweeper");

        assert_eq!(config.initial_capacity, 8);
        assert!(!config.background_expiration);
        assert_eq!(config.sweep_thread_name("ignored"), "sweeper");
    }

    #[test]
    fn test_default_thread_name() {
        assert_eq!(
            TableConfig::default().sweep_thread_name("sessions"),
            "cachetable-sweep-sessions"
        );
    }

    #[test]
    fn test_from_json_partial() {
        let config = TableConfig::from_json(r#"{ "background_expiration": false }"#).unwrap();
        assert!(!config.background_expiration);
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
    }

    #[test_case(r#"{ "thread_name": "" }"# ; "empty thread name")]
    #[test_case(r#"{ "thread_name": "   " }"# ; "blank thread name")]
    #[test_case(r#"{ "thread_name": "a\u0000b" }"# ; "nul in thread name")]
    fn test_from_json_invalid(json: &str) {
        let err = TableConfig::from_json(json).unwrap_err();
        assert!(matches!(err, CacheError::ConfigError(_)));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = TableConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CacheError::JsonError(_)));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = TableConfig::new().with_thread_name("t");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(TableConfig::from_json(&json).unwrap(), config);
    }
}
