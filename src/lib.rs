//! devspace-sweeper - find and safely clean dev junk
//!
//! This crate provides:
//! - A catalog of junk rules (dependency dirs, build output, caches)
//! - A lazy scanner that matches a tree against the catalog
//! - A safety evaluator and an executor that removes only approved entries

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod rules;
pub mod safety;
pub mod scanner;
pub mod signals;
pub mod sweep;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SweeperError};
pub use rules::RuleCatalog;
pub use sweep::{SweepReport, Sweeper};
