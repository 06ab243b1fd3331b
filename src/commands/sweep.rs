//! Sweep command implementation.

use anyhow::{anyhow, Result};
use humansize::{format_size, BINARY};
use std::path::Path;
use std::time::{Duration, Instant};

use super::{build_catalog, plan_with_progress, plural, scan_options};
use crate::cli::SweepArgs;
use crate::config::{days_to_duration, Config};
use crate::rules::Matcher;
use crate::safety::SafetyPolicy;
use crate::signals::CancelToken;
use crate::sweep::{ExecuteOptions, Outcome, SkipReason, SweepReport, Sweeper};

/// Run the sweep command.
pub fn run(args: SweepArgs, config: &Config, quiet: bool, cancel: CancelToken) -> Result<()> {
    let mut catalog = build_catalog(config, &args.target)?;
    if let Some(days) = args.older_than_days {
        catalog = catalog.restricted(Matcher::OlderThan(days_flag(days, "--older-than-days")?));
    }

    let mut policy = SafetyPolicy::from_config(&config.safety);
    if let Some(days) = args.keep_recent_days {
        policy = policy.with_keep_recent(days_flag(days, "--keep-recent-days")?);
    }

    let mut execute = ExecuteOptions::from_config(&config.execute).with_dry_run(args.dry_run);
    if let Some(jobs) = args.jobs {
        execute = execute.with_jobs(jobs);
    }

    let sweeper = Sweeper::new(config, catalog)
        .with_policy(policy)
        .with_scan_options(scan_options(config, &args.target))
        .with_execute_options(execute)
        .with_cancel(cancel);

    let start = Instant::now();
    let plan = plan_with_progress(&sweeper, &args.target, quiet || args.json)?;
    let mut report = sweeper.execute(plan);
    report.elapsed_ms = start.elapsed().as_millis() as u64;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, quiet);
    }

    Ok(())
}

fn days_flag(days: u64, flag: &str) -> Result<Duration> {
    days_to_duration(days).ok_or_else(|| anyhow!("{} {} is too large", flag, days))
}

fn print_report(report: &SweepReport, quiet: bool) {
    if report.entries.is_empty() && report.scan_errors.is_empty() {
        println!("No junk found in {}.", report.root.display());
        return;
    }

    if !quiet {
        if report.dry_run {
            println!("[DRY RUN] Nothing will be removed.");
        }
        println!("\n  {:<9} {:>10}  {}", "STATUS", "SIZE", "PATH");
        println!("  {}", "─".repeat(72));
        for entry in &report.entries {
            let (status, detail) = match &entry.outcome {
                Outcome::Deleted if report.dry_run => ("would rm", None),
                Outcome::Deleted => ("removed", None),
                Outcome::Skipped {
                    reason: SkipReason::Rejected { reason },
                } => ("kept", Some(reason.to_string())),
                Outcome::Skipped {
                    reason: SkipReason::Cancelled,
                } => ("cancelled", None),
                Outcome::Failed { error } => ("FAILED", Some(error.to_string())),
            };
            let path = display_path(&entry.path, &report.root);
            match detail {
                Some(detail) => println!(
                    "  {:<9} {:>10}  {} ({})",
                    status,
                    format_size(entry.size, BINARY),
                    path,
                    detail
                ),
                None => println!("  {:<9} {:>10}  {}", status, format_size(entry.size, BINARY), path),
            }
        }
    }

    let deleted = report.deleted_count();
    let verb = if report.dry_run { "Would free" } else { "Freed" };
    println!("\nResults:");
    println!(
        "  {}: {} ({} entr{})",
        verb,
        format_size(report.bytes_reclaimed, BINARY),
        deleted,
        if deleted == 1 { "y" } else { "ies" }
    );
    let skipped = report.skipped_count();
    if skipped > 0 {
        println!("  Kept:    {} entr{}", skipped, if skipped == 1 { "y" } else { "ies" });
    }
    let failed = report.failed_count();
    if failed > 0 {
        println!("  Failed:  {} entr{}", failed, if failed == 1 { "y" } else { "ies" });
    }
    if !report.scan_errors.is_empty() {
        println!(
            "  Unreadable: {} path{}",
            report.scan_errors.len(),
            plural(report.scan_errors.len())
        );
    }
    if report.cancelled {
        println!("  Interrupted: remaining entries were left in place");
    }

    for entry in report.entries.iter().filter(|e| e.is_failed()) {
        if let Outcome::Failed { error } = &entry.outcome {
            eprintln!("  Error removing {}: {}", entry.path.display(), error);
        }
    }
    for error in &report.scan_errors {
        eprintln!("  Scan error: {}", error);
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
