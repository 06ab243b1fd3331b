use serde::Serialize;
use std::path::PathBuf;

use crate::error::{ExecutionError, ScanError};
use crate::safety::RejectReason;

/// Why an entry was left in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The safety evaluator rejected it
    Rejected { reason: RejectReason },
    /// The run was cancelled before its turn came
    Cancelled,
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Removed, or would have been in dry-run mode
    Deleted,
    Skipped { reason: SkipReason },
    Failed { error: ExecutionError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryReport {
    pub path: PathBuf,
    pub rule_id: String,
    pub size: u64,
    pub outcome: Outcome,
}

impl EntryReport {
    pub fn is_deleted(&self) -> bool {
        matches!(self.outcome, Outcome::Deleted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }
}

/// Terminal artifact of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub cancelled: bool,
    /// One entry per candidate, in scan order
    pub entries: Vec<EntryReport>,
    pub scan_errors: Vec<ScanError>,
    /// Sum of `size` over deleted entries
    pub bytes_reclaimed: u64,
    pub elapsed_ms: u64,
}

impl SweepReport {
    pub(crate) fn new(root: PathBuf, dry_run: bool, entries: Vec<EntryReport>) -> Self {
        let bytes_reclaimed = entries
            .iter()
            .filter(|e| e.is_deleted())
            .map(|e| e.size)
            .sum();
        let cancelled = entries
            .iter()
            .any(|e| matches!(e.outcome, Outcome::Skipped { reason: SkipReason::Cancelled }));
        Self {
            root,
            dry_run,
            cancelled,
            entries,
            scan_errors: Vec::new(),
            bytes_reclaimed,
            elapsed_ms: 0,
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_deleted()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failed()).count()
    }

    /// Scan errors plus failed removals.
    pub fn total_errors(&self) -> usize {
        self.scan_errors.len() + self.failed_count()
    }
}
