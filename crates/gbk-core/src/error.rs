//! Error types for GenBank conversion

use thiserror::Error;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

// SQLite primary result codes that mean the destination itself is unusable.
const SQLITE_PERM: i32 = 3;
const SQLITE_READONLY: i32 = 8;
const SQLITE_IOERR: i32 = 10;
const SQLITE_CORRUPT: i32 = 11;
const SQLITE_FULL: i32 = 13;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_NOTADB: i32 = 26;

/// Errors raised while converting GenBank files
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input file could not be opened or read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input file is not valid GenBank
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    /// Input file contained no GenBank records at all
    #[error("No GenBank records found in '{0}'")]
    EmptyInput(String),

    /// Destination database rejected an operation
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Database lacks some of the converted tables
    #[error("'{path}' is not a gbk-to-sqlite database: missing table(s) {missing}")]
    MissingTables { path: String, missing: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this failure would repeat identically for every later file.
    ///
    /// Bad input and constraint violations are scoped to one file. A full
    /// disk, a read-only or corrupt database, or a dead connection pool are
    /// not, and the batch stops instead of retrying each file.
    pub fn is_systemic(&self) -> bool {
        match self {
            ConvertError::Io { .. } | ConvertError::Parse { .. } | ConvertError::EmptyInput(_) => {
                false
            },
            ConvertError::MissingTables { .. }
            | ConvertError::Config(_)
            | ConvertError::Internal(_) => true,
            ConvertError::Storage(err) => is_systemic_storage_error(err),
        }
    }
}

fn is_systemic_storage_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| {
                matches!(
                    code & 0xff,
                    SQLITE_PERM
                        | SQLITE_READONLY
                        | SQLITE_IOERR
                        | SQLITE_CORRUPT
                        | SQLITE_FULL
                        | SQLITE_CANTOPEN
                        | SQLITE_NOTADB
                )
            })
            .unwrap_or(false),
        sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        _ => false,
    }
}
