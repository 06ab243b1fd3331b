use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Any of these aborts a run before a single entry is deleted.
#[derive(Error, Debug)]
pub enum SweeperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration and rule catalog errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("Unknown rule '{id}'. Valid rules: {valid}")]
    UnknownRule { id: String, valid: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// An entry the scanner could not stat or read. Never fatal.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[error("{}: {message}", display_path(.path))]
pub struct ScanError {
    pub path: Option<PathBuf>,
    pub message: String,
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Why removing an approved entry failed. Never fatal.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("path no longer exists")]
    Vanished,

    #[error("path was replaced by a symlink")]
    BecameSymlink,

    #[error("removal timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("{message}")]
    Io { message: String },
}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SweeperError>;
