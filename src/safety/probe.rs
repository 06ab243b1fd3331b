//! Snapshots of system state the evaluator consults: open files and free space.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum time spent walking `/proc` for one snapshot.
#[cfg(target_os = "linux")]
const PROC_SCAN_BUDGET: std::time::Duration = std::time::Duration::from_secs(5);

/// Maximum number of processes inspected for one snapshot.
#[cfg(target_os = "linux")]
const PROC_SCAN_MAX_PIDS: usize = 4096;

/// Paths held open (or used as working directory) by running processes,
/// together with all their ancestors below the sweep root.
#[derive(Debug, Clone, Default)]
pub struct OpenPaths {
    held: HashSet<PathBuf>,
}

impl OpenPaths {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Best-effort snapshot of the processes visible to us. Always empty on
    /// platforms without `/proc`.
    pub fn snapshot(root: &Path) -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::from_paths(root, proc_open_paths(root))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = root;
            Self::empty()
        }
    }

    /// Build a snapshot from explicit open paths. Paths outside `root` are ignored.
    pub fn from_paths<I>(root: &Path, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut held = HashSet::new();
        for path in paths {
            if !path.starts_with(root) {
                continue;
            }
            for ancestor in path.ancestors() {
                if !ancestor.starts_with(root) || !held.insert(ancestor.to_path_buf()) {
                    break;
                }
            }
        }
        Self { held }
    }

    /// True if `path` or anything below it is in use.
    pub fn contains(&self, path: &Path) -> bool {
        self.held.contains(path)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

#[cfg(target_os = "linux")]
fn proc_open_paths(root: &Path) -> Vec<PathBuf> {
    use std::fs;
    use std::os::unix::ffi::OsStrExt;
    use std::time::Instant;

    let mut found = Vec::new();
    let Ok(proc_dir) = fs::read_dir("/proc") else {
        return found;
    };

    let deadline = Instant::now() + PROC_SCAN_BUDGET;
    let mut pids = 0usize;

    for proc_entry in proc_dir.flatten() {
        if pids >= PROC_SCAN_MAX_PIDS || Instant::now() >= deadline {
            tracing::warn!(pids, "Open file scan budget reached, using partial results");
            break;
        }

        let name = proc_entry.file_name();
        let bytes = name.as_bytes();
        if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
            continue;
        }
        pids += 1;

        let proc_path = proc_entry.path();
        if let Ok(cwd) = fs::read_link(proc_path.join("cwd")) {
            push_target(&mut found, cwd, root);
        }

        let Ok(fds) = fs::read_dir(proc_path.join("fd")) else {
            continue;
        };
        for fd in fds.flatten() {
            if let Ok(target) = fs::read_link(fd.path()) {
                push_target(&mut found, target, root);
            }
        }
    }

    tracing::debug!(pids, open = found.len(), "Captured open paths");
    found
}

#[cfg(target_os = "linux")]
fn push_target(found: &mut Vec<PathBuf>, target: PathBuf, root: &Path) {
    if !target.is_absolute() {
        // sockets, pipes and anon inodes
        return;
    }
    let target = match target.to_str().and_then(|s| s.strip_suffix(" (deleted)")) {
        Some(stripped) => PathBuf::from(stripped),
        None => target,
    };
    if target.starts_with(root) {
        found.push(target);
    }
}

/// Percentage of the volume holding `path` that is available to unprivileged users.
pub fn free_percent(path: &Path) -> nix::Result<f32> {
    let stat = nix::sys::statvfs::statvfs(path)?;

    let block_size = stat.fragment_size() as u64;
    let total = stat.blocks() as u64 * block_size;
    let available = stat.blocks_available() as u64 * block_size;
    let used = total.saturating_sub(stat.blocks_free() as u64 * block_size);

    // reserved blocks are neither used nor available
    let usable_total = used + available;
    if usable_total == 0 {
        return Ok(0.0);
    }
    Ok((available as f64 / usable_total as f64 * 100.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_paths_indexes_ancestors_below_root() {
        let root = Path::new("/work");
        let open = OpenPaths::from_paths(
            root,
            vec![
                PathBuf::from("/work/app/node_modules/.cache/x"),
                PathBuf::from("/elsewhere/file"),
            ],
        );

        assert!(open.contains(Path::new("/work/app/node_modules")));
        assert!(open.contains(Path::new("/work/app/node_modules/.cache/x")));
        assert!(open.contains(Path::new("/work")));
        assert!(!open.contains(Path::new("/")));
        assert!(!open.contains(Path::new("/elsewhere/file")));
        assert!(!open.contains(Path::new("/work/other")));
    }

    #[test]
    fn empty_snapshot() {
        let open = OpenPaths::empty();
        assert!(open.is_empty());
        assert!(!open.contains(Path::new("/")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn snapshot_sees_our_own_open_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let dir = root.join("cache");
        std::fs::create_dir(&dir).unwrap();
        let path = dir.join("held.bin");
        let _file = std::fs::File::create(&path).unwrap();

        let open = OpenPaths::snapshot(&root);
        assert!(open.contains(&dir));
    }

    #[test]
    fn free_percent_is_a_percentage() {
        let tmp = TempDir::new().unwrap();
        let pct = free_percent(tmp.path()).unwrap();
        assert!((0.0..=100.0).contains(&pct));
    }
}
