use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use devspace_sweeper::cli::{Cli, Command};
use devspace_sweeper::commands;
use devspace_sweeper::config::Config;
use devspace_sweeper::SweeperError;
use devspace_sweeper::signals::{install_signal_handlers, CancelToken};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet, config.log_file.as_deref())?;

    tracing::debug!(?config, "Loaded configuration");

    // Dispatch to subcommand
    match cli.command {
        Command::Sweep(args) => {
            tracing::info!(?args, "Starting sweep");
            let cancel = CancelToken::new();
            if let Err(e) = install_signal_handlers(cancel.clone()) {
                tracing::warn!(error = %e, "Could not install signal handlers");
            }
            commands::sweep::run(args, &config, cli.quiet, cancel)?;
        }
        Command::Scan(args) => {
            tracing::info!(?args, "Starting scan");
            commands::scan::run(args, &config, cli.quiet)?;
        }
        Command::Suggest(args) => {
            tracing::info!(?args, "Starting suggest");
            commands::suggest::run(args, &config, cli.quiet)?;
        }
        Command::Report(args) => {
            tracing::info!(?args, "Starting report");
            commands::report::run(args, &config, cli.quiet)?;
        }
        Command::GenIgnore(args) => {
            tracing::info!(?args, "Starting gen-ignore");
            commands::gen_ignore::run(args, &config, cli.quiet)?;
        }
        Command::Rules(args) => {
            commands::rules::run(args, &config)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    use std::fs::OpenOptions;
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devspace_sweeper={}", level)));

    let file_layer = match log_file {
        Some(path) => {
            let path = devspace_sweeper::config::expand_home(path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| SweeperError::Io {
                    path: path.clone(),
                    source,
                })
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}
