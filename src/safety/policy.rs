use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{expand_home, SafetyConfig};

/// Exclusion rules applied to every candidate.
///
/// Paths are stored both as written (with `~` expanded) and, when they
/// exist, canonicalized, so `/etc` still matches on systems where it is a
/// symlink to `/private/etc`.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    pub protected_paths: Vec<PathBuf>,
    pub protected_trees: Vec<PathBuf>,
    pub protected_names: Vec<String>,
    pub keep_marker: Option<String>,
    pub check_processes: bool,
    pub skip_if_free_above: Option<f32>,
    /// Overrides every rule's minimum age for this run
    pub keep_recent: Option<Duration>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::from_config(&SafetyConfig::default())
    }
}

impl SafetyPolicy {
    pub fn from_config(config: &SafetyConfig) -> Self {
        Self {
            protected_paths: normalize(&config.protected_paths),
            protected_trees: normalize(&config.protected_trees),
            protected_names: config.protected_names.clone(),
            keep_marker: config.keep_marker.clone(),
            check_processes: config.check_processes,
            skip_if_free_above: config.skip_if_free_above,
            keep_recent: None,
        }
    }

    /// Policy with no protections at all. Only the root boundary and rule
    /// ages still apply.
    pub fn permissive() -> Self {
        Self {
            protected_paths: Vec::new(),
            protected_trees: Vec::new(),
            protected_names: Vec::new(),
            keep_marker: None,
            check_processes: false,
            skip_if_free_above: None,
            keep_recent: None,
        }
    }

    pub fn with_keep_recent(mut self, keep_recent: Duration) -> Self {
        self.keep_recent = Some(keep_recent);
        self
    }

    pub fn with_protected_tree(mut self, tree: impl AsRef<Path>) -> Self {
        self.protected_trees.extend(normalize(&[tree.as_ref().to_path_buf()]));
        self
    }

    pub fn with_protected_path(mut self, path: impl AsRef<Path>) -> Self {
        self.protected_paths.extend(normalize(&[path.as_ref().to_path_buf()]));
        self
    }
}

fn normalize(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let expanded = expand_home(path);
        if let Ok(canonical) = expanded.canonicalize() {
            if canonical != expanded {
                out.push(canonical);
            }
        }
        out.push(expanded);
    }
    out
}
