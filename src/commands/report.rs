//! Report command implementation

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};
use std::fmt::Write as _;
use std::fs;

use super::{plan_with_progress, sweeper};
use crate::cli::ReportArgs;
use crate::config::Config;
use crate::sweep::{summarize, RuleSummary, SweepPlan};

/// Run the report command
pub fn run(args: ReportArgs, config: &Config, quiet: bool) -> Result<()> {
    let sweeper = sweeper(config, &args.target)?;
    let plan = plan_with_progress(&sweeper, &args.target, quiet)?;
    let groups = summarize(&plan, sweeper.catalog());

    let markdown = render_markdown(&plan, &groups);
    fs::write(&args.output, markdown)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(output = %args.output.display(), groups = groups.len(), "Wrote report");
    println!("Report written to {}", args.output.display());
    Ok(())
}

/// Markdown summary of a plan: one table row per rule, then every match.
pub fn render_markdown(plan: &SweepPlan, groups: &[RuleSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# DevSpace Sweeper Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Root: {}", plan.root.display());
    let _ = writeln!(out);

    if groups.is_empty() {
        let _ = writeln!(out, "No junk found.");
    } else {
        let _ = writeln!(out, "| Rule | Items | Size | Sweepable now | Safety |");
        let _ = writeln!(out, "|------|------:|-----:|--------------:|-------:|");
        for group in groups {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {}% |",
                group.rule_id,
                group.count,
                format_size(group.total_bytes, BINARY),
                format_size(group.approved_bytes, BINARY),
                group.safety
            );
        }

        for group in groups {
            let _ = writeln!(out);
            let _ = writeln!(out, "## {}", group.rule_id);
            if !group.description.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "{}", group.description);
            }
            let _ = writeln!(out);
            for verdict in plan
                .verdicts
                .iter()
                .filter(|v| v.candidate().rule_id == group.rule_id)
            {
                let candidate = verdict.candidate();
                let size = format_size(candidate.size, BINARY);
                match verdict.reason() {
                    None => {
                        let _ = writeln!(out, "- {} ({})", candidate.relative.display(), size);
                    }
                    Some(reason) => {
                        let _ = writeln!(
                            out,
                            "- {} ({}) - kept: {}",
                            candidate.relative.display(),
                            size,
                            reason
                        );
                    }
                }
            }
        }
    }

    if !plan.scan_errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Unreadable paths");
        let _ = writeln!(out);
        for error in &plan.scan_errors {
            let _ = writeln!(out, "- {}", error);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total identifiable size: {}",
        format_size(plan.total_bytes(), BINARY)
    );
    out
}
