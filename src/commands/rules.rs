//! Rules command implementation

use anyhow::Result;
use humansize::{format_size, BINARY};
use serde::Serialize;

use crate::cli::RulesArgs;
use crate::config::Config;
use crate::rules::{AppliesTo, Rule, RuleCatalog};

#[derive(Serialize)]
struct RuleRow<'a> {
    id: &'a str,
    description: &'a str,
    patterns: &'a [String],
    applies_to: AppliesTo,
    min_age_days: u64,
    min_size: u64,
    safety: u8,
    gitignore: Option<&'a str>,
}

impl<'a> From<&'a Rule> for RuleRow<'a> {
    fn from(rule: &'a Rule) -> Self {
        Self {
            id: &rule.id,
            description: &rule.description,
            patterns: rule.patterns(),
            applies_to: rule.applies_to,
            min_age_days: rule.min_age.as_secs() / (24 * 60 * 60),
            min_size: rule.min_size,
            safety: rule.safety,
            gitignore: rule.gitignore.as_deref(),
        }
    }
}

/// Run the rules command
pub fn run(args: RulesArgs, config: &Config) -> Result<()> {
    let mut catalog = RuleCatalog::from_config(config)?;
    if let Some(file) = &args.rules_file {
        catalog.load_file(file)?;
    }

    let rows: Vec<RuleRow> = catalog.rules().iter().map(RuleRow::from).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No rules configured.");
        return Ok(());
    }

    println!(
        "  {:<16} {:<5} {:>7} {:>9} {:>7}  {}",
        "ID", "KIND", "AGE", "MIN SIZE", "SAFETY", "PATTERNS"
    );
    println!("  {}", "─".repeat(72));
    for row in &rows {
        let kind = match row.applies_to {
            AppliesTo::File => "file",
            AppliesTo::Dir => "dir",
            AppliesTo::Any => "any",
        };
        let min_size = if row.min_size == 0 {
            "-".to_string()
        } else {
            format_size(row.min_size, BINARY)
        };
        println!(
            "  {:<16} {:<5} {:>6}d {:>9} {:>6}%  {}",
            row.id,
            kind,
            row.min_age_days,
            min_size,
            row.safety,
            row.patterns.join(", ")
        );
    }

    Ok(())
}
