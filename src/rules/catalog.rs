//! Rule catalog: the immutable set of rules a run works with.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::builtin::builtin_rules;
use super::matcher::Matcher;
use super::rule::Rule;
use crate::config::{Config, RuleConfig, RuleFile};
use crate::error::ConfigError;

/// Ordered collection of rules. Earlier rules win when several match.
///
/// Built once at startup and passed explicitly to the scanner and the
/// safety evaluator.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Catalog holding only the built-in rules.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self {
            rules: builtin_rules()?,
        })
    }

    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        catalog.extend(rules)?;
        Ok(catalog)
    }

    /// Built-in rules (unless disabled) plus `[[rules]]` from the config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut catalog = if config.catalog.builtin {
            Self::builtin()?
        } else {
            Self::default()
        };

        catalog.extend(compile(&config.rules)?)?;

        let disabled: HashSet<&str> = config.catalog.disabled.iter().map(String::as_str).collect();
        catalog.rules.retain(|r| !disabled.contains(r.id.as_str()));
        Ok(catalog)
    }

    /// Add rules from a TOML catalog file containing `[[rules]]` tables.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RuleFile = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), count = file.rules.len(), "Loaded rule file");
        self.extend(compile(&file.rules)?)
    }

    /// Append rules. A rule replaces an earlier one with the same id, but a
    /// batch may not contain the same id twice.
    pub fn extend(&mut self, rules: Vec<Rule>) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::InvalidRule {
                    id: rule.id.clone(),
                    reason: "duplicate rule id".into(),
                });
            }
        }

        for rule in rules {
            match self.rules.iter_mut().find(|r| r.id == rule.id) {
                Some(existing) => {
                    tracing::debug!(id = %rule.id, "Overriding rule");
                    *existing = rule;
                }
                None => self.rules.push(rule),
            }
        }
        Ok(())
    }

    /// Keep only the named rules, in catalog order.
    pub fn with_ids(self, ids: &[String]) -> Result<Self, ConfigError> {
        if ids.is_empty() {
            return Ok(self);
        }
        for id in ids {
            if self.get(id).is_none() {
                return Err(ConfigError::UnknownRule {
                    id: id.clone(),
                    valid: self.ids().join(", "),
                });
            }
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(Self {
            rules: self
                .rules
                .into_iter()
                .filter(|r| wanted.contains(r.id.as_str()))
                .collect(),
        })
    }

    /// Narrow every rule with the same extra condition.
    pub fn restricted(self, extra: Matcher) -> Self {
        Self {
            rules: self
                .rules
                .into_iter()
                .map(|r| r.restricted(extra.clone()))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile(configs: &[RuleConfig]) -> Result<Vec<Rule>, ConfigError> {
    configs.iter().map(Rule::from_config).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AppliesTo;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn rule(id: &str, pattern: &str) -> Rule {
        Rule::builder(id).pattern(pattern).build().unwrap()
    }

    #[test]
    fn builtin_catalog_has_common_rules() {
        let catalog = RuleCatalog::builtin().unwrap();
        let ids = catalog.ids();
        assert!(ids.contains(&"node_modules"));
        assert!(ids.contains(&"target"));
        assert!(ids.contains(&"__pycache__"));
    }

    #[test]
    fn with_ids_filters_and_keeps_order() {
        let catalog = RuleCatalog::builtin()
            .unwrap()
            .with_ids(&["__pycache__".to_string(), "node_modules".to_string()])
            .unwrap();
        assert_eq!(catalog.ids(), vec!["node_modules", "__pycache__"]);
    }

    #[test]
    fn with_ids_rejects_unknown() {
        let err = RuleCatalog::builtin()
            .unwrap()
            .with_ids(&["nope".to_string()])
            .unwrap_err();
        match err {
            ConfigError::UnknownRule { id, valid } => {
                assert_eq!(id, "nope");
                assert!(valid.contains("node_modules"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn with_no_ids_keeps_everything() {
        let catalog = RuleCatalog::builtin().unwrap();
        let len = catalog.len();
        assert_eq!(catalog.with_ids(&[]).unwrap().len(), len);
    }

    #[test]
    fn extend_overrides_same_id() {
        let mut catalog = RuleCatalog::from_rules(vec![rule("a", "a"), rule("b", "b")]).unwrap();
        catalog.extend(vec![rule("a", "aa")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().patterns(), &["aa".to_string()]);
    }

    #[test]
    fn duplicate_ids_in_one_batch_fail() {
        let result = RuleCatalog::from_rules(vec![rule("a", "a"), rule("a", "b")]);
        assert!(matches!(result, Err(ConfigError::InvalidRule { .. })));
    }

    #[test]
    fn from_config_merges_and_disables() {
        let config: Config = toml::from_str(
            r#"
[catalog]
disabled = ["venv"]

[[rules]]
id = "logs"
patterns = ["*.log"]
applies_to = "file"
min_age_days = 2
"#,
        )
        .unwrap();
        let catalog = RuleCatalog::from_config(&config).unwrap();
        assert!(catalog.get("venv").is_none());
        let logs = catalog.get("logs").unwrap();
        assert_eq!(logs.applies_to, AppliesTo::File);
        assert_eq!(logs.min_age, Duration::from_secs(2 * 24 * 60 * 60));
        assert!(catalog.get("node_modules").is_some());
    }

    #[test]
    fn from_config_without_builtin() {
        let mut config = Config::default();
        config.catalog.builtin = false;
        assert!(RuleCatalog::from_config(&config).unwrap().is_empty());
    }

    #[test]
    fn load_file_adds_rules() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[[rules]]\nid = \"tmp\"\nglobs = [\"tmp\"]\n").unwrap();

        let mut catalog = RuleCatalog::default();
        catalog.load_file(file.path()).unwrap();
        assert_eq!(catalog.ids(), vec!["tmp"]);
    }

    #[test]
    fn load_file_errors() {
        let mut catalog = RuleCatalog::default();
        assert!(matches!(
            catalog.load_file(Path::new("/nonexistent/rules.toml")),
            Err(ConfigError::ReadError { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[[rules]\nbroken").unwrap();
        assert!(matches!(
            catalog.load_file(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
