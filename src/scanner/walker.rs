use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{Result, ScanError, SweeperError};
use crate::rules::{EntryFacts, RuleCatalog};

use super::candidate::{CandidateEntry, EntryKind, ScanEvent};
use super::options::ScanOptions;

/// Walks a tree and matches entries against a rule catalog.
pub struct Scanner<'a> {
    catalog: &'a RuleCatalog,
    options: ScanOptions,
}

impl<'a> Scanner<'a> {
    pub fn new(catalog: &'a RuleCatalog, options: ScanOptions) -> Self {
        Self { catalog, options }
    }

    /// Start a scan of `root`. Fails only if `root` is not a usable directory.
    pub fn scan(&self, root: &Path) -> Result<Scan<'a>> {
        let root = canonical_root(root)?;
        let inner = WalkDir::new(&root)
            .follow_links(false)
            .same_file_system(self.options.one_file_system)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Scan {
            catalog: self.catalog,
            options: self.options.clone(),
            root,
            inner,
            stack: Vec::new(),
            errored: HashSet::new(),
            visited: 0,
        })
    }
}

/// Resolve `root` to an absolute directory path.
pub fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| SweeperError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !canonical.is_dir() {
        return Err(SweeperError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    // the root itself must be listable, unlike entries below it
    fs::read_dir(&canonical).map_err(|source| SweeperError::Io {
        path: canonical.clone(),
        source,
    })?;
    Ok(canonical)
}

/// Lazy, depth-first, post-order scan.
///
/// Files are judged when visited; directories once their whole subtree has
/// been enumerated. A directory that structurally matches a rule claims its
/// subtree: descendants still count towards its size and age but never
/// produce candidates of their own. Symlinks are never followed.
pub struct Scan<'a> {
    catalog: &'a RuleCatalog,
    options: ScanOptions,
    root: PathBuf,
    inner: walkdir::IntoIter,
    /// Open directories, `stack[k]` sits at depth `k`
    stack: Vec<Frame>,
    /// Paths that produced an error and have not been closed yet
    errored: HashSet<PathBuf>,
    visited: u64,
}

#[derive(Debug)]
struct Frame {
    path: PathBuf,
    size: u64,
    newest: Option<SystemTime>,
    incomplete: bool,
    /// Index of the rule that claimed this directory
    claim: Option<usize>,
}

impl Frame {
    fn absorb(&mut self, size: u64, modified: Option<SystemTime>, incomplete: bool) {
        self.size = self.size.saturating_add(size);
        self.newest = self.newest.max(modified);
        self.incomplete |= incomplete;
    }
}

impl Scan<'_> {
    /// Canonical root being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries visited so far
    pub fn visited(&self) -> u64 {
        self.visited
    }

    /// Drain the scan into candidates and errors.
    pub fn partition(self) -> (Vec<CandidateEntry>, Vec<ScanError>) {
        let mut candidates = Vec::new();
        let mut errors = Vec::new();
        for event in self {
            match event {
                ScanEvent::Candidate(c) => candidates.push(c),
                ScanEvent::Error(e) => errors.push(e),
            }
        }
        (candidates, errors)
    }

    fn visit(&mut self, entry: walkdir::DirEntry) -> Option<ScanEvent> {
        self.visited += 1;
        match EntryKind::from_file_type(entry.file_type()) {
            EntryKind::Dir => self.close_dir(entry),
            kind => self.visit_leaf(entry, kind),
        }
    }

    fn visit_leaf(&mut self, entry: walkdir::DirEntry, kind: EntryKind) -> Option<ScanEvent> {
        let depth = entry.depth();
        self.sync_stack(entry.path(), depth);

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => return Some(self.record_error(err)),
        };
        let size = if kind == EntryKind::Symlink { 0 } else { metadata.len() };
        let modified = metadata.modified().ok();

        if let Some(parent) = self.stack.last_mut() {
            parent.absorb(size, modified, false);
        }

        if kind == EntryKind::Symlink || self.claimed() || !self.options.within_depth(depth) {
            return None;
        }

        let relative = self.relative(entry.path());
        let facts = EntryFacts {
            path: entry.path(),
            relative: &relative,
            name: entry.file_name(),
            kind,
            size: Some(size),
            modified,
        };
        let rule = self
            .catalog
            .rules()
            .iter()
            .find(|r| r.matches(&facts, self.options.now))?;

        tracing::debug!(path = %entry.path().display(), rule = %rule.id, size, "Candidate file");
        Some(ScanEvent::Candidate(CandidateEntry {
            path: entry.path().to_path_buf(),
            relative,
            kind,
            rule_id: rule.id.clone(),
            size,
            modified,
        }))
    }

    fn close_dir(&mut self, entry: walkdir::DirEntry) -> Option<ScanEvent> {
        let depth = entry.depth();
        let path = entry.path();

        let reuse = self.stack.get(depth).map_or(false, |f| f.path == path);
        let existing = if reuse {
            self.stack.split_off(depth).into_iter().next()
        } else {
            None
        };
        let mut frame = match existing {
            Some(frame) => frame,
            None => {
                // empty directory, nothing below it opened a frame
                self.sync_stack(path, depth);
                self.open_frame(path.to_path_buf(), depth)
            }
        };

        let mut own_error = None;
        let listing_failed = self.errored.contains(path);
        match entry.metadata() {
            Ok(m) => frame.absorb(0, m.modified().ok(), false),
            // already reported when its listing failed
            Err(err) if listing_failed => {
                tracing::debug!(path = %path.display(), error = %err, "Directory gone after listing error");
            }
            Err(err) => own_error = Some(self.record_error(err)),
        }
        if self.errored.remove(path) {
            frame.incomplete = true;
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.absorb(frame.size, frame.newest, frame.incomplete);
        }
        if own_error.is_some() {
            return own_error;
        }

        let rule = &self.catalog.rules()[frame.claim?];
        if frame.incomplete {
            tracing::debug!(path = %path.display(), rule = %rule.id, "Skipping partially unreadable directory");
            return None;
        }

        let relative = self.relative(path);
        let facts = EntryFacts {
            path,
            relative: &relative,
            name: entry.file_name(),
            kind: EntryKind::Dir,
            size: Some(frame.size),
            modified: frame.newest,
        };
        if !rule.matches(&facts, self.options.now) {
            tracing::trace!(path = %path.display(), rule = %rule.id, "Claimed directory below thresholds");
            return None;
        }

        tracing::debug!(path = %path.display(), rule = %rule.id, size = frame.size, "Candidate directory");
        Some(ScanEvent::Candidate(CandidateEntry {
            path: frame.path,
            relative,
            kind: EntryKind::Dir,
            rule_id: rule.id.clone(),
            size: frame.size,
            modified: frame.newest,
        }))
    }

    fn record_error(&mut self, err: walkdir::Error) -> ScanEvent {
        let path = err.path().map(Path::to_path_buf);
        if let Some(p) = &path {
            let depth = self.depth_of(p);
            self.sync_stack(p, depth);
            if let Some(parent) = self.stack.last_mut() {
                parent.incomplete = true;
            }
            self.errored.insert(p.clone());
        }

        let message = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };
        tracing::info!(path = ?path, error = %message, "Scan error");
        ScanEvent::Error(ScanError { path, message })
    }

    /// Make `stack` hold exactly the ancestors of an entry at `depth`.
    fn sync_stack(&mut self, path: &Path, depth: usize) {
        self.stack.truncate(depth);
        while let Some(top) = self.stack.last() {
            if path.starts_with(&top.path) {
                break;
            }
            self.stack.pop();
        }
        for k in self.stack.len()..depth {
            if let Some(ancestor) = path.ancestors().nth(depth - k) {
                let frame = self.open_frame(ancestor.to_path_buf(), k);
                self.stack.push(frame);
            }
        }
    }

    fn open_frame(&self, path: PathBuf, depth: usize) -> Frame {
        let claim = if depth == 0 || !self.options.within_depth(depth) || self.claimed() {
            None
        } else {
            self.structural_claim(&path)
        };
        if let Some(idx) = claim {
            tracing::trace!(path = %path.display(), rule = %self.catalog.rules()[idx].id, "Claimed directory");
        }
        Frame {
            path,
            size: 0,
            newest: None,
            incomplete: false,
            claim,
        }
    }

    fn structural_claim(&self, path: &Path) -> Option<usize> {
        let name = path.file_name()?;
        let relative = self.relative(path);
        let facts = EntryFacts {
            path,
            relative: &relative,
            name,
            kind: EntryKind::Dir,
            size: None,
            modified: None,
        };
        self.catalog
            .rules()
            .iter()
            .position(|r| r.matches_structure(&facts, self.options.now))
    }

    fn claimed(&self) -> bool {
        self.stack.iter().any(|f| f.claim.is_some())
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    fn depth_of(&self, path: &Path) -> usize {
        path.strip_prefix(&self.root)
            .map(|r| r.components().count())
            .unwrap_or(0)
    }
}

impl Iterator for Scan<'_> {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        loop {
            let event = match self.inner.next()? {
                Ok(entry) => self.visit(entry),
                Err(err) => Some(self.record_error(err)),
            };
            if event.is_some() {
                return event;
            }
        }
    }
}
