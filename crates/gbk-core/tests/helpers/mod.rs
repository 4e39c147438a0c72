//! Test helpers for gbk-core integration tests
//!
//! - Fixture paths
//! - Temporary on-disk databases
//! - Row readers for asserting on stored data

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use gbk_core::{ConversionOrchestrator, ConvertConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Temporary directory holding a destination database
///
/// The directory (and the database) is removed on drop.
pub struct TestDb {
    dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("genomes.db")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub async fn orchestrator(&self, config: ConvertConfig) -> ConversionOrchestrator {
        ConversionOrchestrator::open(&self.path(), config)
            .await
            .expect("Failed to open database")
    }
}

/// Stored feature rows of one record, in feature order
pub async fn feature_rows(
    orchestrator: &ConversionOrchestrator,
    record_id: i64,
) -> Vec<(i64, String, Option<i64>, Option<i64>, Option<String>)> {
    sqlx::query_as(
        "SELECT feature_index, kind, location_start, location_end, location_strand \
         FROM feature WHERE record_id = ?1 ORDER BY feature_index",
    )
    .bind(record_id)
    .fetch_all(orchestrator.store().pool())
    .await
    .expect("Failed to read features")
}

/// Stored `(key, value)` qualifier rows of one feature, in qualifier order
pub async fn qualifier_rows(
    orchestrator: &ConversionOrchestrator,
    record_id: i64,
    feature_index: i64,
) -> Vec<(String, Option<String>)> {
    sqlx::query_as(
        "SELECT key, value FROM qualifier \
         WHERE record_id = ?1 AND feature_index = ?2 ORDER BY qualifier_index",
    )
    .bind(record_id)
    .bind(feature_index)
    .fetch_all(orchestrator.store().pool())
    .await
    .expect("Failed to read qualifiers")
}
