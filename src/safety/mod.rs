//! Safety evaluation: turns candidates into approved or rejected verdicts.
//!
//! Evaluation is a pure function of the candidate, the [`SafetyPolicy`] and
//! a [`SafetyContext`] captured once per run (clock, open files, free space).

mod evaluator;
mod policy;
mod probe;
mod verdict;

pub use evaluator::{SafetyContext, SafetyEvaluator};
pub use policy::SafetyPolicy;
pub use probe::{free_percent, OpenPaths};
pub use verdict::{Decision, RejectReason, SafetyVerdict};
