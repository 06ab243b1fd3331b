//! Suggest command implementation

use anyhow::Result;
use humansize::{format_size, BINARY};

use super::{plan_with_progress, plural, sweeper};
use crate::cli::SuggestArgs;
use crate::config::Config;
use crate::sweep::summarize;

/// Run the suggest command
pub fn run(args: SuggestArgs, config: &Config, quiet: bool) -> Result<()> {
    let sweeper = sweeper(config, &args.target)?;
    let plan = plan_with_progress(&sweeper, &args.target, quiet)?;
    let groups = summarize(&plan, sweeper.catalog());

    println!("Suggestions for {}", plan.root.display());
    if groups.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }

    for group in &groups {
        println!(
            "- {} -> {} ({} item{}) | safety: {}% | sweepable now: {}",
            group.rule_id,
            format_size(group.total_bytes, BINARY),
            group.count,
            plural(group.count),
            group.safety,
            format_size(group.approved_bytes, BINARY)
        );
    }

    // count how many groups share each hint, most common first
    let mut hints: Vec<(&str, usize)> = Vec::new();
    for group in &groups {
        if let Some(hint) = group.gitignore.as_deref() {
            match hints.iter_mut().find(|(h, _)| *h == hint) {
                Some((_, seen)) => *seen += group.count,
                None => hints.push((hint, group.count)),
            }
        }
    }
    hints.sort_by(|a, b| b.1.cmp(&a.1));

    if !hints.is_empty() {
        println!("\n.gitignore hints (add to your repo root):");
        for (hint, seen) in hints.iter().take(args.hints) {
            println!("  {}  # seen in {} place{}", hint, seen, plural(*seen));
        }
    }
    println!("\nHint: review the safety score; entries scored 90% or more are regenerated by their build tools.");

    Ok(())
}
