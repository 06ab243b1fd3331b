use serde::Serialize;
use std::fmt;

use crate::scanner::CandidateEntry;

/// Why a candidate was not approved. An expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Not strictly below the sweep root
    OutsideRoot,
    /// A protected path, or an ancestor of one
    ProtectedPath,
    /// Inside (or above) a protected tree
    ProtectedTree,
    /// A path component is protected (`.git`, ...)
    ProtectedName { name: String },
    /// Directory holds a repository
    ContainsRepository { marker: String },
    /// A keep marker sits in the entry or one of its ancestors
    KeepMarker,
    /// Opened by a running process
    InUse,
    TooRecent { age_secs: u64, min_age_secs: u64 },
    /// No modification time is known and the rule has a minimum age
    UnknownAge,
    /// The candidate names a rule this evaluator does not know
    UnknownRule { rule_id: String },
    AmpleFreeSpace { free_percent: f32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OutsideRoot => write!(f, "outside the sweep root"),
            RejectReason::ProtectedPath => write!(f, "protected path"),
            RejectReason::ProtectedTree => write!(f, "inside a protected tree"),
            RejectReason::ProtectedName { name } => write!(f, "protected name '{}'", name),
            RejectReason::ContainsRepository { marker } => write!(f, "contains '{}'", marker),
            RejectReason::KeepMarker => write!(f, "keep marker present"),
            RejectReason::InUse => write!(f, "in use by a running process"),
            RejectReason::TooRecent {
                age_secs,
                min_age_secs,
            } => write!(
                f,
                "modified {} ago, minimum age is {}",
                format_duration(*age_secs),
                format_duration(*min_age_secs)
            ),
            RejectReason::UnknownAge => write!(f, "modification time unknown"),
            RejectReason::UnknownRule { rule_id } => write!(f, "unknown rule '{}'", rule_id),
            RejectReason::AmpleFreeSpace { free_percent } => {
                write!(f, "volume is {:.1}% free", free_percent)
            }
        }
    }
}

fn format_duration(secs: u64) -> String {
    const HOUR: u64 = 60 * 60;
    const DAY: u64 = 24 * HOUR;
    if secs >= DAY {
        format!("{}d", secs / DAY)
    } else if secs >= HOUR {
        format!("{}h", secs / HOUR)
    } else {
        format!("{}s", secs)
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected(RejectReason),
}

/// A candidate together with its decision.
///
/// Only the safety evaluator creates these, so holding an approved verdict
/// proves the candidate went through every check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyVerdict {
    candidate: CandidateEntry,
    decision: Decision,
}

impl SafetyVerdict {
    pub(super) fn approved(candidate: CandidateEntry) -> Self {
        Self {
            candidate,
            decision: Decision::Approved,
        }
    }

    pub(super) fn rejected(candidate: CandidateEntry, reason: RejectReason) -> Self {
        Self {
            candidate,
            decision: Decision::Rejected(reason),
        }
    }

    pub fn candidate(&self) -> &CandidateEntry {
        &self.candidate
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.decision, Decision::Approved)
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match &self.decision {
            Decision::Approved => None,
            Decision::Rejected(reason) => Some(reason),
        }
    }

    pub fn into_parts(self) -> (CandidateEntry, Decision) {
        (self.candidate, self.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::TooRecent {
            age_secs: 3 * 60 * 60,
            min_age_secs: 2 * 24 * 60 * 60,
        };
        assert_eq!(reason.to_string(), "modified 3h ago, minimum age is 2d");
        assert_eq!(
            RejectReason::ProtectedName { name: ".git".into() }.to_string(),
            "protected name '.git'"
        );
    }

    #[test]
    fn reject_reason_serializes_with_kind() {
        let json = serde_json::to_string(&RejectReason::InUse).unwrap();
        assert_eq!(json, r#"{"kind":"in_use"}"#);
        let json = serde_json::to_string(&RejectReason::AmpleFreeSpace { free_percent: 50.0 }).unwrap();
        assert!(json.contains("\"free_percent\":50.0"));
    }
}
