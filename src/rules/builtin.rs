//! Built-in rules.

use std::time::Duration;

use super::rule::{AppliesTo, Rule};
use crate::error::ConfigError;

/// Anything touched in the last day is left alone by default.
const DEFAULT_MIN_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const COVERAGE_SIBLINGS: &[&str] = &["package.json", "pyproject.toml", "setup.py"];

/// Returns all built-in rules.
pub fn builtin_rules() -> Result<Vec<Rule>, ConfigError> {
    let rules = vec![
        Rule::builder("node_modules")
            .description("npm/yarn/pnpm dependency directories")
            .pattern("node_modules")
            .gitignore("node_modules/")
            .safety(95),
        Rule::builder("target")
            .description("Cargo build output")
            .pattern("target")
            .requires_any_sibling(&["Cargo.toml"])
            .gitignore("target/")
            .safety(95),
        Rule::builder("dist")
            .description("JavaScript bundle output")
            .pattern("dist")
            .requires_any_sibling(&["package.json"])
            .gitignore("dist/")
            .safety(95),
        Rule::builder("build")
            .description("Build output next to a known build manifest")
            .pattern("build")
            .requires_any_sibling(&[
                "package.json",
                "build.gradle",
                "build.gradle.kts",
                "CMakeLists.txt",
                "setup.py",
                "pyproject.toml",
            ])
            .gitignore("build/")
            .safety(95),
        Rule::builder("__pycache__")
            .description("Python bytecode caches")
            .pattern("__pycache__")
            .gitignore("**/__pycache__/")
            .safety(95),
        Rule::builder(".pytest_cache")
            .description("pytest cache")
            .pattern(".pytest_cache")
            .gitignore(".pytest_cache/")
            .safety(95),
        Rule::builder("DerivedData")
            .description("Xcode derived data")
            .pattern("DerivedData")
            .gitignore("DerivedData/")
            .safety(95),
        Rule::builder("coverage")
            .description("Test coverage reports")
            .pattern("coverage")
            .requires_any_sibling(COVERAGE_SIBLINGS)
            .gitignore("coverage/")
            .safety(90),
        Rule::builder(".nyc_output")
            .description("nyc raw coverage data")
            .pattern(".nyc_output")
            .requires_any_sibling(COVERAGE_SIBLINGS)
            .gitignore(".nyc_output/")
            .safety(90),
        Rule::builder(".parcel-cache")
            .description("Parcel bundler cache")
            .pattern(".parcel-cache")
            .gitignore(".parcel-cache/")
            .safety(95),
        Rule::builder(".vite")
            .description("Vite dependency cache")
            .pattern(".vite")
            .gitignore(".vite/")
            .safety(95),
        Rule::builder(".next")
            .description("Next.js build output")
            .pattern(".next")
            .gitignore(".next/")
            .safety(95),
        Rule::builder(".nuxt")
            .description("Nuxt build output")
            .pattern(".nuxt")
            .gitignore(".nuxt/")
            .safety(95),
        Rule::builder("venv")
            .description("Python virtual environments")
            .patterns(&[".venv", "venv"])
            .safety(50),
        Rule::builder("pyc")
            .description("Stray Python bytecode files")
            .pattern("*.pyc")
            .applies_to(AppliesTo::File)
            .gitignore("*.pyc")
            .safety(95),
        Rule::builder(".DS_Store")
            .description("macOS Finder metadata")
            .pattern(".DS_Store")
            .applies_to(AppliesTo::File)
            .gitignore(".DS_Store")
            .safety(95),
    ];

    rules
        .into_iter()
        .map(|b| b.min_age(DEFAULT_MIN_AGE).build())
        .collect()
}
