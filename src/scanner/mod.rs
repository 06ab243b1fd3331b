mod candidate;
mod options;
mod walker;

pub use candidate::{CandidateEntry, EntryKind, ScanEvent};
pub use options::ScanOptions;
pub use walker::{canonical_root, Scan, Scanner};
