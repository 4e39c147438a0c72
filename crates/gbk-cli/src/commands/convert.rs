//! `convert` command

use gbk_core::{BatchReport, ConversionOrchestrator, ConvertConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{CliError, Result};
use crate::inputs::collect_inputs;
use crate::progress::{create_file_progress, format_duration};
use crate::ConvertArgs;

/// Configuration from the environment, overridden by command-line flags
pub fn build_config(args: &ConvertArgs) -> Result<ConvertConfig> {
    let mut config = ConvertConfig::from_env()?;

    if let Some(size) = args.batch_size {
        config = config.with_batch_size(size);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_concurrency(jobs);
    }
    if args.fast {
        config = config.with_fast_import(true);
    }
    if args.no_indexes {
        config = config.with_create_indexes(false);
    }

    config.validate()?;
    Ok(config)
}

pub async fn run(args: &ConvertArgs, cancel: CancellationToken) -> Result<()> {
    let inputs = collect_inputs(&args.files, &args.globs)?;
    let config = build_config(args)?;

    info!(
        files = inputs.len(),
        database = %args.database.display(),
        "Converting GenBank files"
    );

    let orchestrator = ConversionOrchestrator::open(&args.database, config).await?;

    let progress = (!args.json).then(|| create_file_progress(inputs.len() as u64, "Converting"));
    let result = orchestrator
        .run_with_progress(&inputs, &cancel, |outcome| {
            if let Some(pb) = &progress {
                pb.set_message(outcome.path().to_string());
                pb.inc(1);
            }
        })
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    orchestrator.store().close().await;

    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    outcome(&report)
}

/// Map a finished batch onto the command's result
fn outcome(report: &BatchReport) -> Result<()> {
    if let Some(reason) = &report.halted {
        return Err(CliError::Halted(reason.clone()));
    }
    if report.cancelled && !report.skipped.is_empty() {
        return Err(CliError::Cancelled {
            skipped: report.skipped.len(),
        });
    }
    if !report.failed.is_empty() {
        return Err(CliError::BatchFailed {
            failed: report.failed.len(),
            total: report.total_files(),
        });
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let records: usize = report.converted.iter().map(|r| r.records).sum();

    println!(
        "Converted {} of {} files: {} records, {} features, {} qualifiers in {}",
        report.converted.len(),
        report.total_files(),
        records,
        report.total_features(),
        report.total_qualifiers(),
        format_duration(report.duration_seconds)
    );

    let ambiguous: usize = report
        .converted
        .iter()
        .map(|r| r.stats.ambiguous_strands)
        .sum();
    let unresolved: usize = report
        .converted
        .iter()
        .map(|r| r.stats.unresolved_locations)
        .sum();
    if ambiguous + unresolved > 0 {
        println!(
            "Locations: {} with mixed strands, {} without local coordinates",
            ambiguous, unresolved
        );
    }

    if !report.failed.is_empty() {
        println!("Failed:");
        for failure in &report.failed {
            println!("  {}: {}", failure.path, failure.error);
        }
    }

    if !report.skipped.is_empty() {
        println!("Not started: {} file(s)", report.skipped.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbk_core::FileFailure;
    use std::path::PathBuf;

    fn args() -> ConvertArgs {
        ConvertArgs {
            files: vec![PathBuf::from("a.gbk")],
            globs: vec![],
            database: PathBuf::from("out.db"),
            batch_size: Some(100),
            jobs: Some(2),
            fast: true,
            no_indexes: true,
            json: false,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.concurrency, 2);
        assert!(config.fast_import);
        assert!(!config.create_indexes);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let mut args = args();
        args.jobs = Some(0);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_outcome_precedence() {
        let mut report = BatchReport::default();
        assert!(outcome(&report).is_ok());

        report.failed.push(FileFailure {
            path: "bad.gbk".to_string(),
            error: "boom".to_string(),
            systemic: false,
        });
        assert!(matches!(
            outcome(&report),
            Err(CliError::BatchFailed { failed: 1, total: 1 })
        ));

        report.cancelled = true;
        report.skipped.push("later.gbk".to_string());
        assert!(matches!(
            outcome(&report),
            Err(CliError::Cancelled { skipped: 1 })
        ));

        report.halted = Some("disk full".to_string());
        assert!(matches!(outcome(&report), Err(CliError::Halted(_))));
    }
}
