//! Rule catalog: declarative definitions of developer junk.
//!
//! This module provides:
//! - A closed set of matcher variants with one dispatch function
//! - Rules built from those matchers plus age/size thresholds
//! - The built-in catalog and TOML-defined user rules

mod builtin;
mod catalog;
mod matcher;
mod rule;

pub use builtin::builtin_rules;
pub use catalog::RuleCatalog;
pub use matcher::{EntryFacts, MatchOn, Matcher, Pattern};
pub use rule::{AppliesTo, Rule, RuleBuilder};
