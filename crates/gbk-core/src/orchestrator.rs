// Batch conversion orchestrator
//
// Runs the pipeline over a list of files with `buffer_unordered`, so up to
// `concurrency` files are converted at once (concurrency 1 keeps input order).
// Each file succeeds or fails on its own. A systemic storage failure, or a
// cancellation request, stops new files from starting; files already running
// finish or roll back as a unit.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::models::{BatchReport, FileFailure, FileReport};
use crate::pipeline::GenbankPipeline;
use crate::storage::GenbankStore;

/// What happened to a single input file
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Converted(FileReport),
    Failed(FileFailure),
    /// Never started (cancelled or halted)
    Skipped(String),
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Converted(report) => &report.path,
            FileOutcome::Failed(failure) => &failure.path,
            FileOutcome::Skipped(path) => path,
        }
    }
}

pub struct ConversionOrchestrator {
    pipeline: GenbankPipeline,
    config: ConvertConfig,
}

impl ConversionOrchestrator {
    pub fn new(pipeline: GenbankPipeline, config: ConvertConfig) -> Self {
        Self { pipeline, config }
    }

    /// Open the destination database and continue its id sequence
    pub async fn open(database: &Path, config: ConvertConfig) -> Result<Self> {
        config.validate()?;
        let store = GenbankStore::open(database, &config).await?;
        let pipeline = GenbankPipeline::resuming(store).await?;
        Ok(Self::new(pipeline, config))
    }

    pub fn store(&self) -> &GenbankStore {
        self.pipeline.store()
    }

    /// Convert every file
    pub async fn run(&self, paths: &[PathBuf], cancel: &CancellationToken) -> Result<BatchReport> {
        self.run_with_progress(paths, cancel, |_| {}).await
    }

    /// Convert every file, calling `on_file` as each one finishes
    ///
    /// Per-file failures end up in the report. An `Err` is returned only when
    /// the post-import index build fails.
    pub async fn run_with_progress<F>(
        &self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
        mut on_file: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&FileOutcome),
    {
        let start_time = Instant::now();
        let concurrency = self.config.concurrency.max(1);
        let total = paths.len();

        info!(
            files = total,
            concurrency,
            batch_size = self.config.batch_size,
            "Starting batch conversion"
        );

        // Cancelled by the caller, or by us after a systemic failure.
        let stop = cancel.child_token();

        let mut outcomes: Vec<(usize, FileOutcome)> = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| {
                let stop = stop.clone();
                async move { (index, self.convert_one(path, index, total, &stop).await) }
            })
            .buffer_unordered(concurrency)
            .inspect(|(_, outcome)| on_file(outcome))
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = BatchReport {
            cancelled: cancel.is_cancelled(),
            ..Default::default()
        };

        for (_, outcome) in outcomes {
            match outcome {
                FileOutcome::Converted(file) => report.converted.push(file),
                FileOutcome::Failed(failure) => {
                    if failure.systemic && report.halted.is_none() {
                        report.halted = Some(format!("{}: {}", failure.path, failure.error));
                    }
                    report.failed.push(failure);
                },
                FileOutcome::Skipped(path) => report.skipped.push(path),
            }
        }

        if self.config.create_indexes && report.halted.is_none() && !report.converted.is_empty() {
            self.store().create_indexes().await?;
        }

        report.duration_seconds = start_time.elapsed().as_secs_f64();

        info!(
            converted = report.converted.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            features = report.total_features(),
            qualifiers = report.total_qualifiers(),
            "Batch complete in {:.2}s",
            report.duration_seconds
        );

        if let Some(reason) = &report.halted {
            error!(reason = %reason, "Batch halted after systemic failure");
        } else if report.cancelled {
            warn!(skipped = report.skipped.len(), "Batch cancelled");
        }

        Ok(report)
    }

    async fn convert_one(
        &self,
        path: &Path,
        index: usize,
        total: usize,
        stop: &CancellationToken,
    ) -> FileOutcome {
        let shown = path.display().to_string();

        if stop.is_cancelled() {
            debug!(path = %shown, "Skipping file, batch stopped");
            return FileOutcome::Skipped(shown);
        }

        info!(path = %shown, "Converting file ({} / {})", index + 1, total);

        match self.pipeline.convert_file(path).await {
            Ok(report) => FileOutcome::Converted(report),
            Err(e) => {
                let systemic = e.is_systemic();
                if systemic {
                    error!(path = %shown, error = %e, "Systemic failure, stopping batch");
                    stop.cancel();
                } else {
                    warn!(path = %shown, error = %e, "File failed, rolled back");
                }
                FileOutcome::Failed(FileFailure {
                    path: shown,
                    error: e.to_string(),
                    systemic,
                })
            },
        }
    }
}
