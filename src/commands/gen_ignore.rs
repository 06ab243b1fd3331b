//! gen-ignore command implementation

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::{plan_with_progress, plural, sweeper};
use crate::cli::GenIgnoreArgs;
use crate::config::Config;
use crate::sweep::{gitignore_hints, summarize};

const HEADER: &str = "# Added by devspace-sweeper";

/// Run the gen-ignore command
pub fn run(args: GenIgnoreArgs, config: &Config, quiet: bool) -> Result<()> {
    let sweeper = sweeper(config, &args.target)?;
    let plan = plan_with_progress(&sweeper, &args.target, quiet)?;
    let hints = gitignore_hints(&summarize(&plan, sweeper.catalog()));

    if hints.is_empty() {
        println!("No .gitignore hints found.");
        return Ok(());
    }

    let path = plan.root.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let missing = missing_hints(&existing, &hints);

    if missing.is_empty() {
        println!("{} already covers every hint.", path.display());
        return Ok(());
    }

    if args.dry_run {
        println!("Would append to {}:\n", path.display());
        for hint in &missing {
            println!("{}", hint);
        }
        return Ok(());
    }

    append_hints(&path, &existing, &missing)
        .with_context(|| format!("Failed to update {}", path.display()))?;
    println!(
        "Appended {} pattern{} to {}",
        missing.len(),
        plural(missing.len()),
        path.display()
    );
    Ok(())
}

/// Hints not already present as a line of `existing`.
pub fn missing_hints(existing: &str, hints: &[String]) -> Vec<String> {
    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    hints
        .iter()
        .filter(|h| !present.contains(&h.as_str()))
        .cloned()
        .collect()
}

fn append_hints(path: &Path, existing: &str, hints: &[String]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    if !existing.is_empty() {
        writeln!(file)?;
    }
    writeln!(file, "{}", HEADER)?;
    for hint in hints {
        writeln!(file, "{}", hint)?;
    }
    Ok(())
}
