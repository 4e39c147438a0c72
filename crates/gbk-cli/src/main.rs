//! gbk-to-sqlite - Main entry point

use clap::Parser;
use gbk_cli::{Cli, Commands};
use gbk_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    let Some(command) = cli.command.as_ref() else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    // Console logs go to stderr; stdout carries the report
    let base_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("gbk-to-sqlite")
        .build();

    // Environment variables take precedence
    let log_config = base_config.clone().merge_env().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring logging environment: {}", e);
        base_config
    });

    // The CLI works without logging
    let guard = init_logging(&log_config).ok();

    // Ctrl-C stops new files from starting; running ones finish or roll back
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing files in progress");
            eprintln!("Interrupted: finishing files in progress (press Ctrl-C again to abort)");
            signal_token.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                process::exit(gbk_cli::error::EXIT_INTERRUPTED);
            }
        }
    });

    let result = match command {
        Commands::Convert(args) => gbk_cli::commands::convert::run(args, cancel).await,
        Commands::Verify { database, json } => {
            gbk_cli::commands::verify::run(database, *json).await
        },
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        drop(guard);
        process::exit(e.exit_code());
    }
}
