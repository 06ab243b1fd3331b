//! The sweep pipeline: scan, evaluate, execute, report.
//!
//! This module provides:
//! - [`Sweeper`], which runs the whole pipeline or just its read-only half
//! - The [`Executor`] that removes approved entries
//! - [`SweepReport`] and per-rule summaries

mod executor;
mod pipeline;
mod report;
pub mod summary;

pub use executor::{ExecuteOptions, Executor};
pub use pipeline::{SweepPlan, Sweeper};
pub use report::{EntryReport, Outcome, SkipReason, SweepReport};
pub use summary::{gitignore_hints, summarize, RuleSummary};
