use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::rules::{AppliesTo, MatchOn};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional file receiving a copy of all log output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub scan: ScanConfig,
    pub safety: SafetyConfig,
    pub execute: ExecuteConfig,
    pub catalog: CatalogConfig,
    /// User-defined rules, appended to (or overriding) the built-in catalog
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Deepest level at which candidates are reported
    pub max_depth: usize,
    /// Don't cross filesystem boundaries
    pub one_file_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Paths that may never be removed themselves (`~` expands to home)
    pub protected_paths: Vec<PathBuf>,
    /// Paths whose whole subtree may never be touched
    pub protected_trees: Vec<PathBuf>,
    /// Path components that veto removal wherever they appear
    pub protected_names: Vec<String>,
    /// Marker file protecting the directory it sits in
    pub keep_marker: Option<String>,
    /// Skip entries held open by running processes (Linux only)
    pub check_processes: bool,
    /// Reject everything while the volume has more free space than this (percent)
    pub skip_if_free_above: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteConfig {
    /// Volumes cleaned in parallel
    pub jobs: usize,
    /// Give up waiting on a single removal after this many seconds
    pub entry_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Include the built-in rules
    pub builtin: bool,
    /// Rule ids to drop from the catalog
    pub disabled: Vec<String>,
}

/// A user-defined junk rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Glob patterns; any match selects the entry
    #[serde(alias = "globs")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub match_on: MatchOn,
    #[serde(default)]
    pub applies_to: AppliesTo,
    /// Only match when one of these files sits next to the entry
    #[serde(default)]
    pub requires_sibling: Vec<String>,
    #[serde(default)]
    pub min_age_days: u64,
    /// Accepts a byte count or a string such as "100MB"
    #[serde(default, deserialize_with = "deserialize_size")]
    pub min_size: u64,
    #[serde(default)]
    pub gitignore: Option<String>,
    #[serde(default = "default_rule_safety")]
    pub safety: u8,
}

/// Wrapper for `--rules <FILE>` catalogs: a file holding only `[[rules]]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_rule_safety() -> u8 {
    70
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            one_file_system: false,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            protected_paths: vec![PathBuf::from("/"), PathBuf::from("~")],
            protected_trees: [
                "/bin",
                "/boot",
                "/dev",
                "/etc",
                "/lib",
                "/lib64",
                "/proc",
                "/sbin",
                "/sys",
                "/usr",
                "/var/lib",
                "/var/log",
                "/System",
                "/Library",
                "/Applications",
                "/private/etc",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            protected_names: vec![".git".to_string(), ".hg".to_string(), ".svn".to_string()],
            keep_marker: Some(".sweeper-keep".to_string()),
            check_processes: true,
            skip_if_free_above: None,
        }
    }
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            entry_timeout_secs: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            disabled: vec![],
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let config = Self::from_file(&path)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check cross-field constraints serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execute.jobs == 0 {
            return Err(ConfigError::Invalid("execute.jobs must be at least 1".into()));
        }
        if self.execute.entry_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "execute.entry_timeout_secs must be positive".into(),
            ));
        }
        if let Some(pct) = self.safety.skip_if_free_above {
            if !(0.0..=100.0).contains(&pct) {
                return Err(ConfigError::Invalid(format!(
                    "safety.skip_if_free_above must be 0-100, got {}",
                    pct
                )));
            }
        }
        if matches!(&self.safety.keep_marker, Some(m) if m.is_empty() || m.contains('/')) {
            return Err(ConfigError::Invalid(
                "safety.keep_marker must be a plain file name".into(),
            ));
        }
        Ok(())
    }
}

/// `~/.config/devspace-sweeper/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("devspace-sweeper").join("config.toml"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeSpec {
        Bytes(u64),
        Text(String),
    }

    match SizeSpec::deserialize(deserializer)? {
        SizeSpec::Bytes(n) => Ok(n),
        SizeSpec::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{}'", s))),
    }
}

/// Convert a day count to a duration. `None` if it does not fit.
pub fn days_to_duration(days: u64) -> Option<Duration> {
    days.checked_mul(24 * 60 * 60).map(Duration::from_secs)
}

/// Parse a size string like "1GB" into bytes
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();

    let (num_str, unit) = if let Some(n) = s.strip_suffix("TB") {
        (n, 1024u64.pow(4))
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1024u64.pow(3))
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024u64.pow(2))
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1u64)
    } else {
        (s.as_str(), 1u64)
    };

    num_str
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0)
        .map(|n| (n * unit as f64) as u64)
}
