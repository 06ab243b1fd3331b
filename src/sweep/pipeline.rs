use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::executor::{ExecuteOptions, Executor};
use super::report::SweepReport;
use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::rules::RuleCatalog;
use crate::safety::{SafetyContext, SafetyEvaluator, SafetyPolicy, SafetyVerdict};
use crate::scanner::{ScanEvent, ScanOptions, Scanner};
use crate::signals::CancelToken;

/// Scan and evaluation results for one root, before anything is removed.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    /// Canonical root
    pub root: PathBuf,
    /// One verdict per candidate, in scan order
    pub verdicts: Vec<SafetyVerdict>,
    pub scan_errors: Vec<ScanError>,
}

impl SweepPlan {
    pub fn approved(&self) -> impl Iterator<Item = &SafetyVerdict> {
        self.verdicts.iter().filter(|v| v.is_approved())
    }

    pub fn approved_bytes(&self) -> u64 {
        self.approved().map(|v| v.candidate().size).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.verdicts.iter().map(|v| v.candidate().size).sum()
    }
}

/// Wires the catalog, scanner, evaluator and executor together.
pub struct Sweeper {
    catalog: RuleCatalog,
    policy: SafetyPolicy,
    scan_options: ScanOptions,
    execute_options: ExecuteOptions,
    cancel: CancelToken,
}

impl Sweeper {
    /// Sweeper using the scan, safety and execute sections of `config`.
    pub fn new(config: &Config, catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            policy: SafetyPolicy::from_config(&config.safety),
            scan_options: ScanOptions::from_config(&config.scan),
            execute_options: ExecuteOptions::from_config(&config.execute),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: SafetyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn with_execute_options(mut self, options: ExecuteOptions) -> Self {
        self.execute_options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    pub fn scan_options(&self) -> &ScanOptions {
        &self.scan_options
    }

    pub fn execute_options(&self) -> &ExecuteOptions {
        &self.execute_options
    }

    /// Scan and evaluate without touching the filesystem.
    pub fn plan(&self, root: &Path) -> Result<SweepPlan> {
        self.plan_observed(root, |_| {})
    }

    /// Like [`plan`](Self::plan), calling `observe` for every scan event as it arrives.
    pub fn plan_observed<F>(&self, root: &Path, mut observe: F) -> Result<SweepPlan>
    where
        F: FnMut(&ScanEvent),
    {
        let scan = Scanner::new(&self.catalog, self.scan_options.clone()).scan(root)?;
        let root = scan.root().to_path_buf();
        tracing::info!(root = %root.display(), rules = self.catalog.len(), "Scanning");

        let mut candidates = Vec::new();
        let mut scan_errors = Vec::new();
        for event in scan {
            observe(&event);
            match event {
                ScanEvent::Candidate(candidate) => candidates.push(candidate),
                ScanEvent::Error(error) => scan_errors.push(error),
            }
        }

        let now = self.scan_options.now;
        let ctx = if candidates.is_empty() {
            SafetyContext::new(&root, now)
        } else {
            SafetyContext::capture(&root, &self.policy, now)
        };
        let evaluator = SafetyEvaluator::new(self.policy.clone(), &self.catalog);
        let verdicts = evaluator.evaluate_all(candidates, &ctx);

        let plan = SweepPlan {
            root,
            verdicts,
            scan_errors,
        };
        tracing::info!(
            candidates = plan.verdicts.len(),
            approved = plan.approved().count(),
            scan_errors = plan.scan_errors.len(),
            "Evaluated candidates"
        );
        Ok(plan)
    }

    /// Act on a plan. Per-entry problems end up in the report.
    pub fn execute(&self, plan: SweepPlan) -> SweepReport {
        let executor = Executor::new(self.execute_options.clone()).with_cancel(self.cancel.clone());
        let mut report = executor.execute(&plan.root, plan.verdicts);
        report.scan_errors = plan.scan_errors;
        report
    }

    /// Scan, evaluate and execute. Only an unusable root fails.
    pub fn run(&self, root: &Path) -> Result<SweepReport> {
        let start = Instant::now();
        let plan = self.plan(root)?;
        let mut report = self.execute(plan);
        report.elapsed_ms = duration_ms(start.elapsed());
        Ok(report)
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
