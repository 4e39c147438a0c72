//! GenBank to SQLite conversion
//!
//! Flattens annotated GenBank files into four relational tables: `genome`,
//! `record`, `feature` and `qualifier`.
//!
//! # Overview
//!
//! - **Location resolver** (`location`): collapses simple, compound and
//!   complemented locations to one `(start, end, strand)` triple
//! - **Qualifier flattener** (`qualifiers`): one row per `/key=value` pair,
//!   order and duplicates preserved
//! - **Entity assigner** (`assigner`): genome/record surrogate ids and derived
//!   feature keys
//! - **Mapper and writer** (`mapper`, `storage`): rows for one file, written
//!   in a single transaction
//! - **Orchestrator** (`orchestrator`): batches of files, optionally
//!   concurrent, with failure isolation and cancellation
//!
//! # Example
//!
//! ```no_run
//! use gbk_core::{ConversionOrchestrator, ConvertConfig};
//! use std::path::{Path, PathBuf};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> gbk_core::Result<()> {
//! let orchestrator =
//!     ConversionOrchestrator::open(Path::new("genomes.db"), ConvertConfig::new()).await?;
//! let report = orchestrator
//!     .run(&[PathBuf::from("phage.gbk")], &CancellationToken::new())
//!     .await?;
//! println!("{} files converted", report.converted.len());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod assigner;
pub mod config;
pub mod error;
pub mod location;
pub mod mapper;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod qualifiers;
pub mod schema;
pub mod storage;

// Re-export commonly used types
pub use assigner::{EntityAssigner, FeatureKey, GenomeIds};
pub use config::ConvertConfig;
pub use error::{ConvertError, Result};
pub use location::{resolve, ResolvedLocation};
pub use models::{BatchReport, FileFailure, FileReport, Location, Strand};
pub use orchestrator::{ConversionOrchestrator, FileOutcome};
pub use pipeline::GenbankPipeline;
pub use storage::{GenbankStore, IntegrityReport, TableCounts};
