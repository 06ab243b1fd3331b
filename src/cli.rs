use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// devspace-sweeper - find and safely clean dev junk
#[derive(Parser, Debug)]
#[command(name = "devspace-sweeper")]
#[command(author, version, about = "Find and safely clean dev junk across projects", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove junk that passes every safety check
    Sweep(SweepArgs),

    /// List junk grouped by rule
    Scan(ScanArgs),

    /// Rank cleanup candidates with safety scores and .gitignore hints
    Suggest(SuggestArgs),

    /// Write a Markdown report of the junk found
    Report(ReportArgs),

    /// Append .gitignore hints for the junk found to <root>/.gitignore
    GenIgnore(GenIgnoreArgs),

    /// List the active rules
    Rules(RulesArgs),
}

/// Where to look and which rules to use; shared by every scanning command.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Root directory to sweep
    #[arg(
        short = 'p',
        long = "root",
        visible_alias = "path",
        default_value = ".",
        value_name = "PATH"
    )]
    pub root: PathBuf,

    /// Only use this rule (can be specified multiple times)
    #[arg(short = 'r', long = "rule", value_name = "ID")]
    pub rules: Vec<String>,

    /// Additional rule catalog (TOML file with [[rules]] tables)
    #[arg(long = "rules", value_name = "FILE")]
    pub rules_file: Option<PathBuf>,

    /// Deepest directory level at which junk is reported
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Don't cross filesystem boundaries
    #[arg(short = 'x', long)]
    pub one_file_system: bool,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be removed without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only match entries not modified in N days
    #[arg(long, value_name = "DAYS")]
    pub older_than_days: Option<u64>,

    /// Keep anything modified within the last N days (overrides rule ages)
    #[arg(long, value_name = "DAYS")]
    pub keep_recent_days: Option<u64>,

    /// Volumes cleaned in parallel
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Examples shown per group
    #[arg(long, default_value = "3", value_name = "N")]
    pub examples: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Maximum number of .gitignore hints shown
    #[arg(long, default_value = "8", value_name = "N")]
    pub hints: usize,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output file
    #[arg(short, long, default_value = "report.md", value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct GenIgnoreArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the hints instead of writing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Additional rule catalog (TOML file with [[rules]] tables)
    #[arg(long = "rules", value_name = "FILE")]
    pub rules_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
