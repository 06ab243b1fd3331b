//! Subcommand implementations.

pub mod gen_ignore;
pub mod report;
pub mod rules;
pub mod scan;
pub mod suggest;
pub mod sweep;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

use crate::cli::TargetArgs;
use crate::config::Config;
use crate::rules::RuleCatalog;
use crate::scanner::{ScanEvent, ScanOptions};
use crate::sweep::{SweepPlan, Sweeper};

/// Catalog from the config, an optional extra rule file and `--rule` filters.
pub fn build_catalog(config: &Config, target: &TargetArgs) -> Result<RuleCatalog> {
    let mut catalog = RuleCatalog::from_config(config)?;
    if let Some(file) = &target.rules_file {
        catalog.load_file(file)?;
    }
    Ok(catalog.with_ids(&target.rules)?)
}

pub fn scan_options(config: &Config, target: &TargetArgs) -> ScanOptions {
    let mut options = ScanOptions::from_config(&config.scan);
    if let Some(depth) = target.max_depth {
        options = options.with_max_depth(depth);
    }
    if target.one_file_system {
        options = options.with_one_file_system(true);
    }
    options
}

/// Sweeper for the read-only commands.
pub fn sweeper(config: &Config, target: &TargetArgs) -> Result<Sweeper> {
    let catalog = build_catalog(config, target)?;
    Ok(Sweeper::new(config, catalog).with_scan_options(scan_options(config, target)))
}

/// Plan with a spinner on stderr when it is a terminal.
pub fn plan_with_progress(sweeper: &Sweeper, target: &TargetArgs, quiet: bool) -> Result<SweepPlan> {
    let progress = if quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    };
    progress.set_message(format!("Scanning {}", target.root.display()));

    let mut found = 0usize;
    let plan = sweeper.plan_observed(&target.root, |event| {
        if let ScanEvent::Candidate(candidate) = event {
            found += 1;
            progress.set_message(format!("{} found, last: {}", found, candidate.relative.display()));
        }
    });
    progress.finish_and_clear();
    Ok(plan?)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
