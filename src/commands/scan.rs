//! Scan command implementation

use anyhow::Result;
use humansize::{format_size, BINARY};
use serde::Serialize;
use std::path::PathBuf;

use super::{plan_with_progress, plural, sweeper};
use crate::cli::ScanArgs;
use crate::config::Config;
use crate::error::ScanError;
use crate::sweep::{summarize, RuleSummary};

#[derive(Serialize)]
struct ScanOutput<'a> {
    root: &'a PathBuf,
    total_bytes: u64,
    groups: &'a [RuleSummary],
    scan_errors: &'a [ScanError],
}

/// Run the scan command
pub fn run(args: ScanArgs, config: &Config, quiet: bool) -> Result<()> {
    let sweeper = sweeper(config, &args.target)?;
    let plan = plan_with_progress(&sweeper, &args.target, quiet || args.json)?;
    let groups = summarize(&plan, sweeper.catalog());
    let total = plan.total_bytes();

    if args.json {
        let output = ScanOutput {
            root: &plan.root,
            total_bytes: total,
            groups: &groups,
            scan_errors: &plan.scan_errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Scanning {}", plan.root.display());
    println!(
        "Found total {} across {} matched group{}",
        format_size(total, BINARY),
        groups.len(),
        plural(groups.len())
    );
    for group in &groups {
        println!(
            "- {}: {} in {} item{}",
            group.rule_id,
            format_size(group.total_bytes, BINARY),
            group.count,
            plural(group.count)
        );
        for example in group.examples.iter().take(args.examples) {
            println!("  example: {}", example.display());
        }
    }
    if !plan.scan_errors.is_empty() {
        eprintln!(
            "{} path{} could not be read (use -v for details)",
            plan.scan_errors.len(),
            plural(plan.scan_errors.len())
        );
    }

    Ok(())
}
