//! `verify` command

use gbk_core::{GenbankStore, IntegrityReport, TableCounts};
use serde::Serialize;
use std::path::Path;

use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
struct VerifyReport {
    counts: TableCounts,
    integrity: IntegrityReport,
    consistent: bool,
}

pub async fn run(database: &Path, json: bool) -> Result<()> {
    if !database.is_file() {
        return Err(CliError::DatabaseNotFound(database.display().to_string()));
    }

    let store = GenbankStore::open_read_only(database).await?;
    let counts = store.counts().await?;
    let integrity = store.check_integrity().await?;
    store.close().await;

    let report = VerifyReport {
        counts,
        integrity,
        consistent: integrity.is_consistent(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.consistent {
        Ok(())
    } else {
        Err(CliError::Integrity(describe(&integrity)))
    }
}

fn print_report(report: &VerifyReport) {
    println!("genome     {:>10}", report.counts.genomes);
    println!("record     {:>10}", report.counts.records);
    println!("feature    {:>10}", report.counts.features);
    println!("qualifier  {:>10}", report.counts.qualifiers);
    println!(
        "Integrity: {}",
        if report.consistent { "OK" } else { "FAILED" }
    );
}

fn describe(integrity: &IntegrityReport) -> String {
    let checks = [
        ("orphan records", integrity.orphan_records),
        ("orphan features", integrity.orphan_features),
        ("orphan qualifiers", integrity.orphan_qualifiers),
        ("invalid locations", integrity.invalid_locations),
    ];

    checks
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_violations() {
        let integrity = IntegrityReport {
            orphan_features: 2,
            invalid_locations: 1,
            ..Default::default()
        };
        assert_eq!(describe(&integrity), "2 orphan features, 1 invalid locations");
    }
}
