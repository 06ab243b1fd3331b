//! Benchmark tests for the scanner and the safety evaluator

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use devspace_sweeper::rules::RuleCatalog;
use devspace_sweeper::safety::{SafetyContext, SafetyEvaluator, SafetyPolicy};
use devspace_sweeper::scanner::{ScanOptions, Scanner};
use std::fs::{self, File};
use std::io::Write;
use std::time::SystemTime;
use tempfile::TempDir;

/// Create `projects` npm projects, each with a populated node_modules and
/// a handful of source files.
fn create_workspace(projects: usize, deps_per_project: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    for p in 0..projects {
        let project = root.join(format!("project{}", p));
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("package.json"), "{}").unwrap();
        for f in 0..5 {
            let mut file = File::create(project.join("src").join(format!("mod{}.js", f))).unwrap();
            file.write_all(&vec![b's'; 256]).unwrap();
        }

        for d in 0..deps_per_project {
            let dep = project.join("node_modules").join(format!("dep{}", d));
            fs::create_dir_all(&dep).unwrap();
            let mut file = File::create(dep.join("index.js")).unwrap();
            file.write_all(&vec![b'x'; 1024]).unwrap();
        }
    }

    dir
}

fn benchmark_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let catalog = RuleCatalog::builtin().unwrap();

    for projects in [10, 50, 100].iter() {
        let dir = create_workspace(*projects, 20);

        group.bench_with_input(BenchmarkId::new("builtin", projects), projects, |b, _| {
            b.iter(|| {
                let scanner = Scanner::new(&catalog, ScanOptions::default());
                scanner.scan(black_box(dir.path())).unwrap().partition()
            })
        });
    }

    group.finish();
}

fn benchmark_deep_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_scan");
    let catalog = RuleCatalog::builtin().unwrap();

    // 6 levels deep with 10 files each and nothing to match
    let dir = TempDir::new().unwrap();
    let mut current = dir.path().to_path_buf();
    for level in 0..6 {
        current = current.join(format!("level{}", level));
        fs::create_dir(&current).unwrap();

        for f in 0..10 {
            let mut file = File::create(current.join(format!("file{}.txt", f))).unwrap();
            file.write_all(&vec![b'z'; 512]).unwrap();
        }
    }

    group.bench_function("no_matches", |b| {
        b.iter(|| {
            let scanner = Scanner::new(&catalog, ScanOptions::default());
            scanner.scan(black_box(dir.path())).unwrap().partition()
        })
    });

    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let catalog = RuleCatalog::builtin().unwrap();
    let dir = create_workspace(100, 5);
    let scanner = Scanner::new(&catalog, ScanOptions::default());
    let (candidates, _) = scanner.scan(dir.path()).unwrap().partition();
    let root = fs::canonicalize(dir.path()).unwrap();

    let evaluator = SafetyEvaluator::new(SafetyPolicy::default(), &catalog);
    let ctx = SafetyContext::new(root, SystemTime::now());

    group.bench_function("evaluate_all", |b| {
        b.iter(|| evaluator.evaluate_all(black_box(candidates.clone()), &ctx))
    });

    group.finish();
}

criterion_group!(benches, benchmark_scan, benchmark_deep_scan, benchmark_evaluate);
criterion_main!(benches);
