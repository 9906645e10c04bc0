//! Turns the results of a probe run into graded judgments and the advisories
//! published for them.
//!
//! Two evaluators share the same grading: [`RuleChain`] walks the probes in
//! order and may stop the whole run, [`Evaluator`] groups rules by category
//! and lets each category stop on its own.

mod advisory;
mod assess;
pub mod category;
pub mod chain;
mod context;
mod grade;
mod judgment;

use std::collections::BTreeMap;

use mxtls_common::{ProbeResult, TlsTestType};

pub use advisory::{Advisory, Severity, catalogue};
pub use assess::{Assessment, Findings, assess};
pub use category::{Evaluator, Rule};
pub use chain::{ChainRule, RuleChain};
pub use context::TestContext;
pub use grade::Grade;
pub use judgment::{EvaluationResult, Judgment};

/// Every probe result of one run, keyed by the probe that produced it.
pub type ProbeMatrix = BTreeMap<TlsTestType, ProbeResult>;
