//! gbk-to-sqlite CLI Library
//!
//! Command-line front end for `gbk-core`.
//!
//! - **Conversion**: flatten GenBank files into a SQLite database
//!   (`gbk-to-sqlite convert`)
//! - **Verification**: row counts and integrity checks
//!   (`gbk-to-sqlite verify`)

pub mod commands;
pub mod error;
pub mod inputs;
pub mod progress;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gbk-to-sqlite - Flatten GenBank annotations into SQLite
#[derive(Parser, Debug)]
#[command(name = "gbk-to-sqlite")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown and exit
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert GenBank files into a SQLite database
    Convert(ConvertArgs),

    /// Check a converted database for dangling references
    Verify {
        /// SQLite database to check
        #[arg(short, long, env = "GBK_DATABASE")]
        database: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// GenBank files to convert (plain or gzip-compressed)
    pub files: Vec<PathBuf>,

    /// Glob pattern selecting more input files (repeatable)
    #[arg(short, long = "glob", value_name = "PATTERN")]
    pub globs: Vec<String>,

    /// Destination SQLite database (created if missing, appended to otherwise)
    #[arg(short, long, env = "GBK_DATABASE")]
    pub database: PathBuf,

    /// Rows per INSERT statement [default: 5000]
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Number of files converted at the same time [default: 1]
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Faster, non-durable import (no fsync, in-memory journal)
    #[arg(long)]
    pub fast: bool,

    /// Skip building secondary indexes after the import
    #[arg(long)]
    pub no_indexes: bool,

    /// Print the batch report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "gbk-to-sqlite",
            "convert",
            "a.gbk",
            "b.gbk.gz",
            "--glob",
            "data/*.gbk",
            "--database",
            "out.db",
            "--jobs",
            "4",
            "--fast",
        ])
        .unwrap();

        let Some(Commands::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.globs, vec!["data/*.gbk".to_string()]);
        assert_eq!(args.database, PathBuf::from("out.db"));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.batch_size, None);
        assert!(args.fast);
        assert!(!args.no_indexes);
    }
}
