//! Error types for the gbk-to-sqlite CLI
//!
//! Messages are user-facing and say what to do next where there is something
//! to do.

use gbk_core::ConvertError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code used when the user interrupted the run
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum CliError {
    /// Neither file arguments nor glob matches
    #[error("No input files. Pass GenBank files as arguments or select them with --glob.")]
    NoInputs,

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Database not found: '{0}'. Create it with 'gbk-to-sqlite convert' first.")]
    DatabaseNotFound(String),

    /// Some files were rolled back; the rest were committed
    #[error("{failed} of {total} files failed to convert. Committed files are kept; fix the failed inputs and convert them again.")]
    BatchFailed { failed: usize, total: usize },

    /// A failure that would repeat for every file stopped the run
    #[error("Conversion stopped: {0}")]
    Halted(String),

    #[error("Interrupted: {skipped} file(s) were not converted")]
    Cancelled { skipped: usize },

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cancelled { .. } => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}
