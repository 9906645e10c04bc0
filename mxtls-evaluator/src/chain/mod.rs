//! The ordered, short-circuiting rule chain.
//!
//! Rules run in declaration order against the probe result of the test type
//! they name. A rule that returns [`ControlFlow::Break`] ends the run; the
//! only state passed between rules is the [`TestContext`].

mod rules;

use std::ops::ControlFlow;

use mxtls_common::{ProbeResult, TlsTestType, internal};

use crate::{Judgment, ProbeMatrix, TestContext, assess::failure_reason};

pub use rules::*;

pub trait ChainRule: Send + Sync {
    fn test_type(&self) -> TlsTestType;

    /// Grade `result` into `context`. Must depend on nothing but its inputs.
    fn evaluate(&self, context: &mut TestContext, result: &ProbeResult) -> ControlFlow<()>;
}

pub struct RuleChain {
    rules: Vec<Box<dyn ChainRule>>,
}

impl RuleChain {
    pub fn new(rules: Vec<Box<dyn ChainRule>>) -> Self {
        Self { rules }
    }

    /// One rule per probe of the standard matrix, in matrix order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(Tls12BestSuite),
            Box::new(Tls12ServerPreference),
            Box::new(Tls12Sha2Suite),
            Box::new(Tls12WeakSuiteNotSelected),
            Box::new(Tls11Enabled),
            Box::new(Tls11WeakSuiteNotSelected),
            Box::new(Tls10Enabled),
            Box::new(Tls10WeakSuiteNotSelected),
            Box::new(Ssl3Enabled),
            Box::new(SecureCurve),
            Box::new(SecureDhGroup),
            Box::new(WeakSuitesRejected),
            Box::new(Tls13Supported),
        ])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The test types, in the order the chain consumes them.
    pub fn test_types(&self) -> impl Iterator<Item = TlsTestType> + '_ {
        self.rules.iter().map(|rule| rule.test_type())
    }

    pub fn evaluate(&self, results: &ProbeMatrix) -> TestContext {
        let mut context = TestContext::default();

        let flow = self.rules.iter().enumerate().try_for_each(|(cursor, rule)| {
            context.cursor = cursor;
            let test_type = rule.test_type();

            let flow = match results.get(&test_type) {
                None => {
                    context.mark_inconclusive(Judgment::inconclusive(test_type, "Test was not run"));
                    ControlFlow::Continue(())
                }
                Some(result) => match result.error() {
                    Some(error) if error.is_inconclusive() => {
                        context.mark_inconclusive(Judgment::inconclusive(
                            test_type,
                            failure_reason(result),
                        ));
                        ControlFlow::Continue(())
                    }
                    _ => rule.evaluate(&mut context, result),
                },
            };

            if flow.is_continue() {
                context.cursor = cursor + 1;
            }
            flow
        });

        if flow.is_break() {
            internal!(
                level = DEBUG,
                "Rule chain stopped at {} of {}",
                context.cursor + 1,
                self.rules.len()
            );
        }

        context
    }
}
