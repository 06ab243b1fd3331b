//! A single junk definition.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use super::matcher::{EntryFacts, MatchOn, Matcher, Pattern};
use crate::config::{days_to_duration, RuleConfig};
use crate::error::ConfigError;
use crate::scanner::EntryKind;

/// Which kinds of entries a rule may select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliesTo {
    File,
    #[default]
    Dir,
    Any,
}

impl AppliesTo {
    pub fn accepts(self, kind: EntryKind) -> bool {
        match (self, kind) {
            (_, EntryKind::Symlink) => false,
            (AppliesTo::Any, _) => true,
            (AppliesTo::File, EntryKind::File) => true,
            (AppliesTo::Dir, EntryKind::Dir) => true,
            _ => false,
        }
    }
}

/// Immutable rule, built once at startup.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub applies_to: AppliesTo,
    /// Checked by the safety evaluator against its clock, not by the scanner
    pub min_age: Duration,
    pub min_size: u64,
    pub gitignore: Option<String>,
    /// 0-100, how confident we are that matches are disposable
    pub safety: u8,
    patterns: Vec<String>,
    matcher: Matcher,
    structure: Matcher,
}

impl Rule {
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    pub fn from_config(cfg: &RuleConfig) -> Result<Self, ConfigError> {
        let patterns: Vec<&str> = cfg.patterns.iter().map(String::as_str).collect();
        let siblings: Vec<&str> = cfg.requires_sibling.iter().map(String::as_str).collect();
        let min_age = days_to_duration(cfg.min_age_days).ok_or_else(|| ConfigError::InvalidRule {
            id: cfg.id.clone(),
            reason: format!("min_age_days {} is too large", cfg.min_age_days),
        })?;
        let mut builder = Rule::builder(&cfg.id)
            .patterns(&patterns)
            .match_on(cfg.match_on)
            .applies_to(cfg.applies_to)
            .requires_any_sibling(&siblings)
            .min_age(min_age)
            .min_size(cfg.min_size)
            .safety(cfg.safety);
        if let Some(desc) = &cfg.description {
            builder = builder.description(desc);
        }
        if let Some(hint) = &cfg.gitignore {
            builder = builder.gitignore(hint);
        }
        builder.build()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Full match, thresholds included.
    pub fn matches(&self, facts: &EntryFacts<'_>, now: SystemTime) -> bool {
        self.applies_to.accepts(facts.kind) && self.matcher.matches(facts, now)
    }

    /// Name/layout part only; used to claim a directory before descending.
    pub fn matches_structure(&self, facts: &EntryFacts<'_>, now: SystemTime) -> bool {
        self.applies_to.accepts(facts.kind) && self.structure.matches(facts, now)
    }

    /// Narrow this rule with an extra condition.
    pub fn restricted(mut self, extra: Matcher) -> Self {
        if extra.is_structural() {
            self.structure = Matcher::All(vec![self.structure, extra.clone()]);
        }
        self.matcher = Matcher::All(vec![self.matcher, extra]);
        self
    }
}

/// Builder for [`Rule`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    description: Option<String>,
    patterns: Vec<String>,
    match_on: MatchOn,
    applies_to: AppliesTo,
    siblings: Vec<String>,
    min_age: Duration,
    min_size: u64,
    gitignore: Option<String>,
    safety: u8,
}

impl RuleBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            patterns: vec![],
            match_on: MatchOn::Name,
            applies_to: AppliesTo::Dir,
            siblings: vec![],
            min_age: Duration::ZERO,
            min_size: 0,
            gitignore: None,
            safety: 70,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.patterns.push(pattern.to_string());
        self
    }

    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.patterns.extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    pub fn match_on(mut self, on: MatchOn) -> Self {
        self.match_on = on;
        self
    }

    pub fn applies_to(mut self, applies_to: AppliesTo) -> Self {
        self.applies_to = applies_to;
        self
    }

    /// Require one of these names next to the entry (e.g. `Cargo.toml` for `target`).
    pub fn requires_any_sibling(mut self, names: &[&str]) -> Self {
        self.siblings.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn min_age(mut self, min_age: Duration) -> Self {
        self.min_age = min_age;
        self
    }

    pub fn min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn gitignore(mut self, hint: &str) -> Self {
        self.gitignore = Some(hint.to_string());
        self
    }

    pub fn safety(mut self, safety: u8) -> Self {
        self.safety = safety;
        self
    }

    pub fn build(self) -> Result<Rule, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRule {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if self.patterns.is_empty() {
            return Err(invalid("at least one pattern is required".into()));
        }
        if self.safety > 100 {
            return Err(invalid(format!("safety must be 0-100, got {}", self.safety)));
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p, self.match_on)
                    .map(Matcher::Pattern)
                    .map_err(|e| invalid(format!("bad pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut structure = vec![Matcher::Any(patterns)];
        if !self.siblings.is_empty() {
            structure.push(Matcher::Any(
                self.siblings
                    .iter()
                    .map(|s| Matcher::SiblingExists(s.clone()))
                    .collect(),
            ));
        }
        let structure = Matcher::All(structure);

        let matcher = if self.min_size > 0 {
            Matcher::All(vec![structure.clone(), Matcher::LargerThan(self.min_size)])
        } else {
            structure.clone()
        };

        let description = self
            .description
            .unwrap_or_else(|| format!("Matches {}", self.patterns.join(", ")));

        Ok(Rule {
            id: self.id,
            description,
            applies_to: self.applies_to,
            min_age: self.min_age,
            min_size: self.min_size,
            gitignore: self.gitignore,
            safety: self.safety,
            patterns: self.patterns,
            matcher,
            structure,
        })
    }
}
