// Conversion configuration

use crate::error::{ConvertError, Result};

/// Default number of rows per multi-row INSERT statement
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Conversion configuration
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Rows per INSERT statement (clamped to SQLite's bind-parameter limit)
    pub batch_size: usize,

    /// Number of files converted at the same time
    pub concurrency: usize,

    /// Trade durability for import speed (no fsync, in-memory journal)
    pub fast_import: bool,

    /// Create secondary indexes once the batch is finished
    pub create_indexes: bool,

    /// How long a writer waits for the database lock before failing
    pub busy_timeout_secs: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
            fast_import: false,
            create_indexes: true,
            busy_timeout_secs: 30,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by environment variables
    ///
    /// - `GBK_BATCH_SIZE`
    /// - `GBK_CONCURRENCY`
    /// - `GBK_FAST_IMPORT` (true/false)
    /// - `GBK_CREATE_INDEXES` (true/false)
    /// - `GBK_BUSY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(size) = env_parse("GBK_BATCH_SIZE")? {
            config.batch_size = size;
        }

        if let Some(concurrency) = env_parse("GBK_CONCURRENCY")? {
            config.concurrency = concurrency;
        }

        if let Some(fast) = env_parse("GBK_FAST_IMPORT")? {
            config.fast_import = fast;
        }

        if let Some(indexes) = env_parse("GBK_CREATE_INDEXES")? {
            config.create_indexes = indexes;
        }

        if let Some(timeout) = env_parse("GBK_BUSY_TIMEOUT_SECS")? {
            config.busy_timeout_secs = timeout;
        }

        Ok(config)
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fast_import(mut self, fast: bool) -> Self {
        self.fast_import = fast;
        self
    }

    pub fn with_create_indexes(mut self, create: bool) -> Self {
        self.create_indexes = create;
        self
    }

    pub fn with_busy_timeout(mut self, seconds: u64) -> Self {
        self.busy_timeout_secs = seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConvertError::config("batch size must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(ConvertError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConvertError::config(format!("{}={:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}
