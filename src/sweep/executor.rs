//! Executor for approved verdicts.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use super::report::{EntryReport, Outcome, SkipReason, SweepReport};
use crate::config::ExecuteConfig;
use crate::error::ExecutionError;
use crate::safety::{Decision, SafetyVerdict};
use crate::scanner::CandidateEntry;
use crate::signals::CancelToken;

/// Options for the executor.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// If true, report what would be removed without touching anything.
    pub dry_run: bool,
    /// Number of volumes processed concurrently.
    pub jobs: usize,
    /// Give up waiting on a single removal after this long.
    pub entry_timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
            entry_timeout: None,
        }
    }
}

impl ExecuteOptions {
    pub fn from_config(config: &ExecuteConfig) -> Self {
        Self {
            dry_run: false,
            jobs: config.jobs.max(1),
            entry_timeout: config.entry_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_entry_timeout(mut self, timeout: Duration) -> Self {
        self.entry_timeout = Some(timeout);
        self
    }
}

/// Removes approved entries and records what happened to every verdict.
pub struct Executor {
    options: ExecuteOptions,
    cancel: CancelToken,
    /// Removals that outlived their timeout
    stragglers: Mutex<Vec<Straggler>>,
}

/// A removal worker still owed a result after its timeout expired. The
/// worker thread is detached; only its result channel is kept.
struct Straggler {
    path: PathBuf,
    result: Receiver<io::Result<()>>,
}

impl Straggler {
    /// Final outcome of the removal if it is known by now. `None` means the
    /// worker is still running and the entry stays timed out.
    fn settle(&self) -> Option<Outcome> {
        match self.result.try_recv() {
            Ok(Ok(())) => Some(Outcome::Deleted),
            Ok(Err(e)) => Some(Outcome::Failed {
                error: ExecutionError::from(e),
            }),
            // remove_dir_all unlinks the top directory last
            Err(_) => match fs::symlink_metadata(&self.path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Some(Outcome::Deleted),
                _ => None,
            },
        }
    }
}

impl Executor {
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            cancel: CancelToken::new(),
            stragglers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &ExecuteOptions {
        &self.options
    }

    /// Process every verdict. Individual failures are recorded in the
    /// report; this never fails as a whole.
    pub fn execute(&self, root: &Path, verdicts: Vec<SafetyVerdict>) -> SweepReport {
        let start = Instant::now();

        let mut outcomes = if self.options.jobs > 1 {
            self.execute_by_volume(&verdicts)
        } else {
            verdicts.iter().map(|v| self.process(v)).collect()
        };
        self.settle_stragglers(&verdicts, &mut outcomes);

        let entries = verdicts
            .into_iter()
            .zip(outcomes)
            .map(|(verdict, outcome)| {
                let (candidate, _) = verdict.into_parts();
                EntryReport {
                    path: candidate.path,
                    rule_id: candidate.rule_id,
                    size: candidate.size,
                    outcome,
                }
            })
            .collect();

        let mut report = SweepReport::new(root.to_path_buf(), self.options.dry_run, entries);
        report.elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            deleted = report.deleted_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            bytes = report.bytes_reclaimed,
            dry_run = report.dry_run,
            cancelled = report.cancelled,
            "Sweep finished"
        );
        report
    }

    /// Volumes in parallel, entries within one volume in order.
    fn execute_by_volume(&self, verdicts: &[SafetyVerdict]) -> Vec<Outcome> {
        let mut volumes: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (idx, verdict) in verdicts.iter().enumerate() {
            volumes
                .entry(volume_of(&verdict.candidate().path))
                .or_default()
                .push(idx);
        }

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!(error = %e, "Could not build worker pool, removing sequentially");
                return verdicts.iter().map(|v| self.process(v)).collect();
            }
        };

        tracing::debug!(volumes = volumes.len(), jobs = self.options.jobs, "Executing per volume");
        let groups: Vec<Vec<usize>> = volumes.into_values().collect();
        let mut indexed: Vec<(usize, Outcome)> = pool.install(|| {
            groups
                .into_par_iter()
                .flat_map_iter(|group| {
                    group
                        .into_iter()
                        .map(|idx| (idx, self.process(&verdicts[idx])))
                        .collect::<Vec<_>>()
                })
                .collect()
        });
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    fn process(&self, verdict: &SafetyVerdict) -> Outcome {
        let candidate = verdict.candidate();
        match verdict.decision() {
            Decision::Rejected(reason) => Outcome::Skipped {
                reason: SkipReason::Rejected {
                    reason: reason.clone(),
                },
            },
            Decision::Approved => {
                if self.cancel.is_cancelled() {
                    return Outcome::Skipped {
                        reason: SkipReason::Cancelled,
                    };
                }
                if self.options.dry_run {
                    tracing::debug!(path = %candidate.path.display(), "Would remove");
                    return Outcome::Deleted;
                }
                match self.remove(candidate) {
                    Ok(()) => {
                        tracing::debug!(path = %candidate.path.display(), size = candidate.size, "Removed");
                        Outcome::Deleted
                    }
                    Err(error) => {
                        tracing::warn!(path = %candidate.path.display(), %error, "Removal failed");
                        Outcome::Failed { error }
                    }
                }
            }
        }
    }

    fn remove(&self, candidate: &CandidateEntry) -> Result<(), ExecutionError> {
        // the tree may have changed since the scan
        let metadata = fs::symlink_metadata(&candidate.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExecutionError::Vanished,
            _ => ExecutionError::from(e),
        })?;
        if metadata.file_type().is_symlink() {
            return Err(ExecutionError::BecameSymlink);
        }
        let is_dir = metadata.is_dir();

        match self.options.entry_timeout {
            None => remove_path(&candidate.path, is_dir).map_err(ExecutionError::from),
            Some(timeout) => self.remove_with_timeout(candidate.path.clone(), is_dir, timeout),
        }
    }

    fn remove_with_timeout(&self, path: PathBuf, is_dir: bool, timeout: Duration) -> Result<(), ExecutionError> {
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        let handle = thread::Builder::new()
            .name("sweep-remove".to_string())
            .spawn(move || {
                let _ = tx.send(remove_path(&worker_path, is_dir));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = handle.join();
                result.map_err(ExecutionError::from)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.stragglers
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(Straggler { path, result: rx });
                Err(ExecutionError::TimedOut {
                    secs: timeout.as_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(ExecutionError::Io {
                    message: "removal worker exited without a result".to_string(),
                })
            }
        }
    }

    /// Replace timed out outcomes whose removal has since finished. Never
    /// waits on a worker that is still running.
    fn settle_stragglers(&self, verdicts: &[SafetyVerdict], outcomes: &mut [Outcome]) {
        let stragglers: Vec<Straggler> = self
            .stragglers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        if stragglers.is_empty() {
            return;
        }

        let mut settled = HashMap::new();
        for straggler in stragglers {
            match straggler.settle() {
                Some(outcome) => {
                    tracing::debug!(path = %straggler.path.display(), ?outcome, "Timed out removal settled");
                    settled.insert(straggler.path, outcome);
                }
                None => {
                    tracing::warn!(path = %straggler.path.display(), "Removal still running after timeout, not waiting for it");
                }
            }
        }

        for (verdict, outcome) in verdicts.iter().zip(outcomes.iter_mut()) {
            if let Some(known) = settled.remove(&verdict.candidate().path) {
                *outcome = known;
            }
        }
    }
}

fn remove_path(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(unix)]
fn volume_of(path: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::symlink_metadata(path).map(|m| m.dev()).unwrap_or(0)
}

#[cfg(not(unix))]
fn volume_of(_path: &Path) -> u64 {
    0
}
