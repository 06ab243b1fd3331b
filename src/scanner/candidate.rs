use serde::Serialize;
use std::fs::FileType;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::error::ScanError;

/// Kind of filesystem entry, as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

impl EntryKind {
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        }
    }
}

/// An entry matched by a rule, not yet safety-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    /// Absolute path
    pub path: PathBuf,

    /// Path relative to the sweep root
    pub relative: PathBuf,

    pub kind: EntryKind,

    /// Id of the rule that matched
    pub rule_id: String,

    /// Apparent size in bytes (recursive for directories)
    pub size: u64,

    /// Newest modification time in the entry (subtree for directories)
    pub modified: Option<SystemTime>,
}

/// One item of the scanner's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Candidate(CandidateEntry),
    Error(ScanError),
}
