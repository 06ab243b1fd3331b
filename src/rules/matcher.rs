//! Closed set of rule conditions and the dispatch that evaluates them.

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::scanner::EntryKind;

/// What a glob pattern is tested against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOn {
    /// The final path component (`node_modules`, `*.pyc`).
    #[default]
    Name,
    /// The path relative to the sweep root (`**/build/tmp`).
    Path,
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    on: MatchOn,
    glob: GlobMatcher,
}

impl Pattern {
    /// Compile `source`. `*` never crosses a path separator.
    pub fn new(source: &str, on: MatchOn) -> Result<Self, globset::Error> {
        let glob = GlobBuilder::new(source)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        Ok(Self {
            source: source.to_string(),
            on,
            glob,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn on(&self) -> MatchOn {
        self.on
    }
}

/// Everything a matcher may look at.
///
/// `size` and `modified` are `None` while a directory's subtree has not been
/// walked yet; threshold conditions pass in that case so the structural part
/// of a rule can be decided before descending.
#[derive(Debug, Clone, Copy)]
pub struct EntryFacts<'a> {
    pub path: &'a Path,
    pub relative: &'a Path,
    pub name: &'a OsStr,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

/// Rule condition.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Glob match on name or relative path.
    Pattern(Pattern),
    /// A file or directory with this name exists next to the entry.
    SiblingExists(String),
    /// Last modification is at least this long before the scan clock.
    OlderThan(Duration),
    /// Entry (recursive for directories) holds at least this many bytes.
    LargerThan(u64),
    /// Every inner condition holds. Empty is true.
    All(Vec<Matcher>),
    /// At least one inner condition holds. Empty is false.
    Any(Vec<Matcher>),
}

impl Matcher {
    pub fn matches(&self, facts: &EntryFacts<'_>, now: SystemTime) -> bool {
        evaluate(self, facts, now)
    }

    /// True when the condition depends only on names and layout.
    pub fn is_structural(&self) -> bool {
        match self {
            Matcher::Pattern(_) | Matcher::SiblingExists(_) => true,
            Matcher::OlderThan(_) | Matcher::LargerThan(_) => false,
            Matcher::All(inner) | Matcher::Any(inner) => inner.iter().all(Matcher::is_structural),
        }
    }
}

fn evaluate(matcher: &Matcher, facts: &EntryFacts<'_>, now: SystemTime) -> bool {
    match matcher {
        Matcher::Pattern(pattern) => match pattern.on {
            MatchOn::Name => pattern.glob.is_match(facts.name),
            MatchOn::Path => pattern.glob.is_match(facts.relative),
        },
        Matcher::SiblingExists(name) => facts
            .path
            .parent()
            .map(|parent| parent.join(name).symlink_metadata().is_ok())
            .unwrap_or(false),
        Matcher::OlderThan(min) => match facts.modified {
            Some(modified) => now.duration_since(modified).unwrap_or(Duration::ZERO) >= *min,
            None => true,
        },
        Matcher::LargerThan(min) => facts.size.map_or(true, |size| size >= *min),
        Matcher::All(inner) => inner.iter().all(|m| evaluate(m, facts, now)),
        Matcher::Any(inner) => inner.iter().any(|m| evaluate(m, facts, now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn facts<'a>(path: &'a Path, relative: &'a Path) -> EntryFacts<'a> {
        EntryFacts {
            path,
            relative,
            name: path.file_name().unwrap(),
            kind: EntryKind::Dir,
            size: Some(500),
            modified: None,
        }
    }

    #[test]
    fn name_pattern_matches_last_component() {
        let m = Matcher::Pattern(Pattern::new("node_modules", MatchOn::Name).unwrap());
        let path = PathBuf::from("/tmp/proj/node_modules");
        let rel = PathBuf::from("proj/node_modules");
        assert!(m.matches(&facts(&path, &rel), SystemTime::now()));

        let path = PathBuf::from("/tmp/node_modules/proj");
        let rel = PathBuf::from("node_modules/proj");
        assert!(!m.matches(&facts(&path, &rel), SystemTime::now()));
    }

    #[test]
    fn path_pattern_respects_separators() {
        let m = Matcher::Pattern(Pattern::new("*/build", MatchOn::Path).unwrap());
        let path = PathBuf::from("/r/app/build");
        let rel = PathBuf::from("app/build");
        assert!(m.matches(&facts(&path, &rel), SystemTime::now()));

        let path = PathBuf::from("/r/a/b/build");
        let rel = PathBuf::from("a/b/build");
        assert!(!m.matches(&facts(&path, &rel), SystemTime::now()));

        let m = Matcher::Pattern(Pattern::new("**/build", MatchOn::Path).unwrap());
        assert!(m.matches(&facts(&path, &rel), SystemTime::now()));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        assert!(Pattern::new("[unclosed", MatchOn::Name).is_err());
    }

    #[test]
    fn thresholds_pass_while_unknown() {
        let path = PathBuf::from("/r/x");
        let rel = PathBuf::from("x");
        let mut f = facts(&path, &rel);
        f.size = None;
        assert!(Matcher::LargerThan(1 << 40).matches(&f, SystemTime::now()));
        assert!(Matcher::OlderThan(DAY).matches(&f, SystemTime::now()));
    }

    #[test]
    fn size_threshold() {
        let path = PathBuf::from("/r/x");
        let rel = PathBuf::from("x");
        let f = facts(&path, &rel);
        assert!(Matcher::LargerThan(500).matches(&f, SystemTime::now()));
        assert!(!Matcher::LargerThan(501).matches(&f, SystemTime::now()));
    }

    #[test]
    fn age_threshold_uses_given_clock() {
        let path = PathBuf::from("/r/x");
        let rel = PathBuf::from("x");
        let now = SystemTime::now();
        let mut f = facts(&path, &rel);
        f.modified = Some(now - 2 * DAY);

        assert!(Matcher::OlderThan(DAY).matches(&f, now));
        assert!(!Matcher::OlderThan(3 * DAY).matches(&f, now));
        // modified in the future counts as brand new
        assert!(!Matcher::OlderThan(DAY).matches(&f, now - 3 * DAY));
    }

    #[test]
    fn sibling_exists_checks_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "").unwrap();
        let target = tmp.path().join("target");
        let rel = PathBuf::from("target");

        assert!(Matcher::SiblingExists("Cargo.toml".into()).matches(&facts(&target, &rel), SystemTime::now()));
        assert!(!Matcher::SiblingExists("package.json".into()).matches(&facts(&target, &rel), SystemTime::now()));
    }

    #[test]
    fn composites() {
        let path = PathBuf::from("/r/x");
        let rel = PathBuf::from("x");
        let f = facts(&path, &rel);
        let now = SystemTime::now();

        assert!(Matcher::All(vec![]).matches(&f, now));
        assert!(!Matcher::Any(vec![]).matches(&f, now));
        assert!(!Matcher::All(vec![Matcher::LargerThan(1), Matcher::LargerThan(1000)]).matches(&f, now));
        assert!(Matcher::Any(vec![Matcher::LargerThan(1), Matcher::LargerThan(1000)]).matches(&f, now));
    }

    #[test]
    fn structural_classification() {
        let pat = Matcher::Pattern(Pattern::new("x", MatchOn::Name).unwrap());
        assert!(pat.is_structural());
        assert!(!Matcher::All(vec![pat.clone(), Matcher::LargerThan(1)]).is_structural());
        assert!(Matcher::Any(vec![pat, Matcher::SiblingExists("y".into())]).is_structural());
    }
}
