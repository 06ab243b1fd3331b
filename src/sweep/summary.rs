//! Per-rule aggregation of a plan, used by the read-only commands.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use super::pipeline::SweepPlan;
use crate::rules::RuleCatalog;

/// Paths kept per group for display.
pub const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub description: String,
    pub total_bytes: u64,
    pub count: usize,
    /// Bytes the safety evaluator would let go
    pub approved_bytes: u64,
    pub approved_count: usize,
    /// First few matches, relative to the root
    pub examples: Vec<PathBuf>,
    pub safety: u8,
    pub gitignore: Option<String>,
}

/// Group a plan's candidates by rule, largest groups first.
pub fn summarize(plan: &SweepPlan, catalog: &RuleCatalog) -> Vec<RuleSummary> {
    let mut groups: HashMap<&str, RuleSummary> = HashMap::new();

    for verdict in &plan.verdicts {
        let candidate = verdict.candidate();
        let summary = groups.entry(candidate.rule_id.as_str()).or_insert_with(|| {
            let rule = catalog.get(&candidate.rule_id);
            RuleSummary {
                rule_id: candidate.rule_id.clone(),
                description: rule.map(|r| r.description.clone()).unwrap_or_default(),
                total_bytes: 0,
                count: 0,
                approved_bytes: 0,
                approved_count: 0,
                examples: Vec::new(),
                safety: rule.map_or(0, |r| r.safety),
                gitignore: rule.and_then(|r| r.gitignore.clone()),
            }
        });

        summary.total_bytes += candidate.size;
        summary.count += 1;
        if verdict.is_approved() {
            summary.approved_bytes += candidate.size;
            summary.approved_count += 1;
        }
        if summary.examples.len() < MAX_EXAMPLES {
            summary.examples.push(candidate.relative.clone());
        }
    }

    let mut ranked: Vec<RuleSummary> = groups.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_bytes
            .cmp(&a.total_bytes)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    ranked
}

/// Distinct `.gitignore` hints of the given groups, in rank order.
pub fn gitignore_hints(summaries: &[RuleSummary]) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    for hint in summaries.iter().filter_map(|s| s.gitignore.as_ref()) {
        if !hints.contains(hint) {
            hints.push(hint.clone());
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scanner::ScanOptions;
    use crate::sweep::Sweeper;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn create_workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for (i, size) in [300usize, 100, 50].iter().enumerate() {
            let proj = root.join(format!("web-{}", i));
            fs::create_dir_all(proj.join("node_modules")).unwrap();
            fs::write(proj.join("node_modules/blob"), vec![0u8; *size]).unwrap();
            fs::write(proj.join("package.json"), "{}").unwrap();
            fs::create_dir_all(proj.join("dist")).unwrap();
            fs::write(proj.join("dist/bundle.js"), vec![0u8; 10]).unwrap();
        }
        fs::create_dir_all(root.join("py/__pycache__")).unwrap();
        fs::write(root.join("py/__pycache__/m.pyc"), vec![0u8; 1000]).unwrap();
        tmp
    }

    fn plan_for(root: &std::path::Path, catalog: RuleCatalog) -> SweepPlan {
        let later = SystemTime::now() + Duration::from_secs(3 * 24 * 60 * 60);
        Sweeper::new(&Config::default(), catalog)
            .with_scan_options(ScanOptions::default().with_now(later))
            .plan(root)
            .unwrap()
    }

    #[test]
    fn groups_are_ranked_by_bytes() {
        let tmp = create_workspace();
        let catalog = RuleCatalog::builtin().unwrap();
        let plan = plan_for(tmp.path(), catalog.clone());

        let summaries = summarize(&plan, &catalog);
        let ids: Vec<&str> = summaries.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["__pycache__", "node_modules", "dist"]);

        let nm = &summaries[1];
        assert_eq!(nm.total_bytes, 450);
        assert_eq!(nm.count, 3);
        assert_eq!(nm.approved_bytes, 450);
        assert_eq!(nm.safety, 95);
        assert_eq!(nm.examples.len(), 3);
        assert!(nm.examples.iter().all(|p| p.is_relative()));
    }

    #[test]
    fn hints_are_deduplicated() {
        let tmp = create_workspace();
        let catalog = RuleCatalog::builtin().unwrap();
        let plan = plan_for(tmp.path(), catalog.clone());

        let hints = gitignore_hints(&summarize(&plan, &catalog));
        assert_eq!(hints, vec!["**/__pycache__/", "node_modules/", "dist/"]);
    }

    #[test]
    fn examples_are_capped() {
        let tmp = TempDir::new().unwrap();
        for i in 0..8 {
            fs::create_dir_all(tmp.path().join(format!("p{}/__pycache__", i))).unwrap();
        }
        let catalog = RuleCatalog::builtin().unwrap();
        let plan = plan_for(tmp.path(), catalog.clone());

        let summaries = summarize(&plan, &catalog);
        assert_eq!(summaries[0].count, 8);
        assert_eq!(summaries[0].examples.len(), MAX_EXAMPLES);
    }

    #[test]
    fn every_cache_gets_its_own_hint() {
        let tmp = TempDir::new().unwrap();
        let app = tmp.path().join("app");
        fs::create_dir_all(app.join(".next/cache")).unwrap();
        fs::write(app.join(".next/cache/chunk"), vec![0u8; 200]).unwrap();
        fs::create_dir_all(app.join(".nyc_output")).unwrap();
        fs::write(app.join(".nyc_output/out.json"), vec![0u8; 100]).unwrap();
        fs::write(app.join("package.json"), "{}").unwrap();
        let catalog = RuleCatalog::builtin().unwrap();
        let plan = plan_for(tmp.path(), catalog.clone());

        let summaries = summarize(&plan, &catalog);
        let ids: Vec<&str> = summaries.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(ids, vec![".next", ".nyc_output"]);

        let hints = gitignore_hints(&summaries);
        assert_eq!(hints, vec![".next/", ".nyc_output/"]);
    }
}
