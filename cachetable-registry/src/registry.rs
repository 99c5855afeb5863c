//! Named table registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use cachetable_core::{CacheKey, CacheValue, Result};
use cachetable_engine::{Logger, Table, TableConfig};

/// Registry of named tables sharing one key and value type.
///
/// # Thread Safety
///
/// All operations are thread-safe. Concurrent `table` calls for the same
/// name always return handles to the same table.
pub struct Registry<K, V> {
    /// Name → table handle
    tables: DashMap<String, Table<K, V>>,
    /// Configuration for tables created on demand
    config: TableConfig,
    /// Logger attached to tables created on demand
    logger: RwLock<Option<Logger>>,
}

impl<K: CacheKey, V: CacheValue> Registry<K, V> {
    /// Creates an empty registry using the default table configuration.
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            config: TableConfig::default(),
            logger: RwLock::new(None),
        }
    }

    /// Creates an empty registry whose new tables use `config`.
    pub fn with_config(config: TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Returns the configuration applied to tables created on demand.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Attaches `logger` to every table this registry creates from now on.
    pub fn set_logger(&self, logger: Logger) {
        *self.logger.write() = Some(logger);
    }

    /// Stops attaching a logger to new tables.
    pub fn remove_logger(&self) {
        *self.logger.write() = None;
    }

    /// Returns the table called `name`, creating it if needed.
    pub fn table(&self, name: &str) -> Result<Table<K, V>> {
        if let Some(table) = self.tables.get(name) {
            return Ok(table.clone());
        }
        self.get_or_create(name, self.config.clone())
    }

    /// Like [`table`](Self::table), but a newly created table uses `config`.
    ///
    /// An existing table is returned unchanged.
    pub fn table_with_config(&self, name: &str, config: TableConfig) -> Result<Table<K, V>> {
        config.validate()?;
        self.get_or_create(name, config)
    }

    fn get_or_create(&self, name: &str, config: TableConfig) -> Result<Table<K, V>> {
        match self.tables.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let table = self.create(name, config)?;
                Ok(entry.insert(table).clone())
            }
        }
    }

    fn create(&self, name: &str, config: TableConfig) -> Result<Table<K, V>> {
        debug!(table = name, "Creating table");
        let table = Table::with_config(name, config)?;
        if let Some(logger) = self.logger.read().clone() {
            table.set_logger(logger);
        }
        Ok(table)
    }

    /// Returns the table called `name` without creating it.
    pub fn get(&self, name: &str) -> Option<Table<K, V>> {
        self.tables.get(name).map(|entry| entry.value().clone())
    }

    /// Returns true if a table called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Removes the table called `name` and stops its sweeper.
    ///
    /// Items remain reachable through handles that are still held.
    #[instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Option<Table<K, V>> {
        let (_, table) = self.tables.remove(name)?;
        table.shutdown();
        debug!("Removed table");
        Some(table)
    }

    /// Returns the names of all tables, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the registry holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Flushes and stops every table, then empties the registry.
    #[instrument(skip(self), fields(tables = self.tables.len()))]
    pub fn shutdown(&self) {
        let tables: Vec<Table<K, V>> = self.tables.iter().map(|entry| entry.value().clone()).collect();
        self.tables.clear();

        for table in tables {
            table.flush();
            table.shutdown();
        }
        debug!("Registry shut down");
    }
}

impl<K: CacheKey, V: CacheValue> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey, V: CacheValue> std::fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tables", &self.names())
            .field("config", &self.config)
            .finish()
    }
}
