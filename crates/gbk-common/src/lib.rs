//! Shared plumbing for the gbk-to-sqlite workspace
//!
//! Currently this is the logging setup used by every binary; conversion
//! logic lives in `gbk-core`.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;

pub use logging::{init_logging, LogConfig, LoggingGuard};
