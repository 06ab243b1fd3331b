use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::policy::SafetyPolicy;
use super::probe::{free_percent, OpenPaths};
use super::verdict::{RejectReason, SafetyVerdict};
use crate::rules::RuleCatalog;
use crate::scanner::{CandidateEntry, EntryKind};

/// Everything outside the candidate that a verdict depends on, captured once
/// per run so that evaluation is repeatable.
#[derive(Debug, Clone)]
pub struct SafetyContext {
    pub root: PathBuf,
    pub now: SystemTime,
    pub open_paths: OpenPaths,
    pub free_percent: Option<f32>,
}

impl SafetyContext {
    /// Context with no open files and unknown free space.
    pub fn new(root: impl Into<PathBuf>, now: SystemTime) -> Self {
        Self {
            root: root.into(),
            now,
            open_paths: OpenPaths::empty(),
            free_percent: None,
        }
    }

    /// Probe the system for whatever `policy` needs.
    pub fn capture(root: &Path, policy: &SafetyPolicy, now: SystemTime) -> Self {
        let open_paths = if policy.check_processes {
            OpenPaths::snapshot(root)
        } else {
            OpenPaths::empty()
        };
        let free = if policy.skip_if_free_above.is_some() {
            match free_percent(root) {
                Ok(pct) => Some(pct),
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Could not read free space");
                    None
                }
            }
        } else {
            None
        };

        Self {
            root: root.to_path_buf(),
            now,
            open_paths,
            free_percent: free,
        }
    }

    pub fn with_open_paths(mut self, open_paths: OpenPaths) -> Self {
        self.open_paths = open_paths;
        self
    }

    pub fn with_free_percent(mut self, pct: f32) -> Self {
        self.free_percent = Some(pct);
        self
    }
}

/// Applies a [`SafetyPolicy`] to candidates.
#[derive(Debug, Clone)]
pub struct SafetyEvaluator {
    policy: SafetyPolicy,
    min_ages: HashMap<String, Duration>,
}

impl SafetyEvaluator {
    pub fn new(policy: SafetyPolicy, catalog: &RuleCatalog) -> Self {
        let min_ages = catalog
            .rules()
            .iter()
            .map(|r| (r.id.clone(), r.min_age))
            .collect();
        Self { policy, min_ages }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Judge one candidate. Checks run from cheapest and most fundamental to
    /// the situational ones; the first failing check decides.
    pub fn evaluate(&self, candidate: &CandidateEntry, ctx: &SafetyContext) -> SafetyVerdict {
        match self.first_rejection(candidate, ctx) {
            Some(reason) => {
                tracing::debug!(path = %candidate.path.display(), %reason, "Rejected");
                SafetyVerdict::rejected(candidate.clone(), reason)
            }
            None => SafetyVerdict::approved(candidate.clone()),
        }
    }

    /// Judge a batch in parallel. Output order matches input order.
    pub fn evaluate_all(&self, candidates: Vec<CandidateEntry>, ctx: &SafetyContext) -> Vec<SafetyVerdict> {
        candidates
            .into_par_iter()
            .map(|c| self.evaluate(&c, ctx))
            .collect()
    }

    fn first_rejection(&self, candidate: &CandidateEntry, ctx: &SafetyContext) -> Option<RejectReason> {
        let path = candidate.path.as_path();

        if path == ctx.root || !path.starts_with(&ctx.root) {
            return Some(RejectReason::OutsideRoot);
        }

        if let Some(reason) = self.protected(path) {
            return Some(reason);
        }

        if let Some(name) = self.protected_component(path) {
            return Some(RejectReason::ProtectedName { name });
        }

        if candidate.kind == EntryKind::Dir {
            if let Some(marker) = self.repository_marker(path) {
                return Some(RejectReason::ContainsRepository { marker });
            }
        }

        if let Some(marker) = &self.policy.keep_marker {
            let marked = path
                .ancestors()
                .take_while(|a| a.starts_with(&ctx.root))
                .any(|a| a.join(marker).symlink_metadata().is_ok());
            if marked {
                return Some(RejectReason::KeepMarker);
            }
        }

        if ctx.open_paths.contains(path) {
            return Some(RejectReason::InUse);
        }

        if let Some(reason) = self.too_young(candidate, ctx.now) {
            return Some(reason);
        }

        if let (Some(threshold), Some(free)) = (self.policy.skip_if_free_above, ctx.free_percent) {
            if free > threshold {
                return Some(RejectReason::AmpleFreeSpace { free_percent: free });
            }
        }

        None
    }

    fn protected(&self, path: &Path) -> Option<RejectReason> {
        // a candidate above a protected location would take it down too
        if self
            .policy
            .protected_paths
            .iter()
            .any(|p| p.starts_with(path))
        {
            return Some(RejectReason::ProtectedPath);
        }
        if self
            .policy
            .protected_trees
            .iter()
            .any(|t| path.starts_with(t) || t.starts_with(path))
        {
            return Some(RejectReason::ProtectedTree);
        }
        None
    }

    fn protected_component(&self, path: &Path) -> Option<String> {
        path.components().find_map(|c| {
            let name = c.as_os_str().to_str()?;
            self.policy
                .protected_names
                .iter()
                .find(|p| p.as_str() == name)
                .cloned()
        })
    }

    fn repository_marker(&self, path: &Path) -> Option<String> {
        self.policy
            .protected_names
            .iter()
            .find(|name| path.join(name).symlink_metadata().is_ok())
            .cloned()
    }

    fn too_young(&self, candidate: &CandidateEntry, now: SystemTime) -> Option<RejectReason> {
        let min_age = match self.policy.keep_recent {
            Some(keep) => keep,
            None => match self.min_ages.get(&candidate.rule_id) {
                Some(age) => *age,
                None => {
                    return Some(RejectReason::UnknownRule {
                        rule_id: candidate.rule_id.clone(),
                    })
                }
            },
        };
        if min_age.is_zero() {
            return None;
        }

        let Some(modified) = candidate.modified else {
            return Some(RejectReason::UnknownAge);
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < min_age {
            return Some(RejectReason::TooRecent {
                age_secs: age.as_secs(),
                min_age_secs: min_age.as_secs(),
            });
        }
        None
    }
}
