//! Rules partitioned by category, each category short-circuiting on its own.

mod tls;

use crate::{EvaluationResult, Grade, Judgment};

pub use tls::{ProbeRule, standard_rules};

pub trait Rule<T>: Send + Sync {
    /// Rules sharing a category stop together.
    fn category(&self) -> &'static str;

    /// A failing stop rule skips the rest of its category.
    fn is_stop_rule(&self) -> bool {
        false
    }

    fn evaluate(&self, input: &T) -> Vec<Judgment>;
}

/// The default failure predicate.
pub fn is_worse_than_pass(judgment: &Judgment) -> bool {
    judgment.grade.is_worse_than(Grade::Pass)
}

pub struct Evaluator<T> {
    rules: Vec<Box<dyn Rule<T>>>,
}

impl<T> Evaluator<T> {
    pub fn new(rules: Vec<Box<dyn Rule<T>>>) -> Self {
        Self { rules }
    }

    /// Categories in order of first appearance, each with its rules in
    /// declaration order.
    fn categories(&self) -> Vec<(&'static str, Vec<&dyn Rule<T>>)> {
        let mut categories: Vec<(&'static str, Vec<&dyn Rule<T>>)> = Vec::new();

        for rule in &self.rules {
            match categories
                .iter_mut()
                .find(|(category, _)| *category == rule.category())
            {
                Some((_, rules)) => rules.push(rule.as_ref()),
                None => categories.push((rule.category(), vec![rule.as_ref()])),
            }
        }

        categories
    }

    pub fn evaluate(&self, input: &T) -> EvaluationResult {
        self.evaluate_with(input, is_worse_than_pass)
    }

    pub fn evaluate_with<F>(&self, input: &T, is_failure: F) -> EvaluationResult
    where
        F: Fn(&Judgment) -> bool,
    {
        let mut judgments = Vec::new();

        for (category, rules) in self.categories() {
            for rule in rules {
                let produced = rule.evaluate(input);
                let stop = rule.is_stop_rule() && produced.iter().any(&is_failure);
                judgments.extend(produced);

                if stop {
                    tracing::debug!(category, "Stop rule failed, skipping the rest of the category");
                    break;
                }
            }
        }

        EvaluationResult::new(judgments)
    }
}

#[cfg(test)]
mod tests {
    use mxtls_common::TlsTestType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::advisory::catalogue;

    /// Grades the input number: zero passes, anything else fails.
    struct Numbered {
        category: &'static str,
        stop: bool,
        test_type: TlsTestType,
    }

    impl Rule<u8> for Numbered {
        fn category(&self) -> &'static str {
            self.category
        }

        fn is_stop_rule(&self) -> bool {
            self.stop
        }

        fn evaluate(&self, input: &u8) -> Vec<Judgment> {
            let advisory = if *input == 0 {
                &catalogue::SSL3_DISABLED
            } else {
                &catalogue::SSL3_ENABLED
            };
            vec![Judgment::from_advisory(self.test_type, advisory, None)]
        }
    }

    fn rule(category: &'static str, stop: bool, test_type: TlsTestType) -> Box<dyn Rule<u8>> {
        Box::new(Numbered {
            category,
            stop,
            test_type,
        })
    }

    fn evaluator() -> Evaluator<u8> {
        Evaluator::new(vec![
            rule("a", true, TlsTestType::Tls12AvailableWithBestCipherSuiteSelected),
            rule("b", false, TlsTestType::Tls11AvailableWithBestCipherSuiteSelected),
            rule("a", false, TlsTestType::Tls12AvailableWithSha2HashFunctionSelected),
            rule("b", false, TlsTestType::Tls11AvailableWithWeakCipherSuiteNotSelected),
        ])
    }

    fn test_types(result: &EvaluationResult) -> Vec<TlsTestType> {
        result.judgments().iter().map(|judgment| judgment.test_type).collect()
    }

    #[test]
    fn test_failing_stop_rule_skips_only_its_category() {
        let result = evaluator().evaluate(&1);

        assert_eq!(
            test_types(&result),
            vec![
                TlsTestType::Tls12AvailableWithBestCipherSuiteSelected,
                TlsTestType::Tls11AvailableWithBestCipherSuiteSelected,
                TlsTestType::Tls11AvailableWithWeakCipherSuiteNotSelected,
            ]
        );
    }

    #[test]
    fn test_passing_stop_rule_continues() {
        let result = evaluator().evaluate(&0);

        assert_eq!(result.len(), 4);
        assert_eq!(result.worst(), Some(Grade::Pass));
    }

    #[test]
    fn test_custom_predicate() {
        let result = evaluator().evaluate_with(&1, |judgment| judgment.grade == Grade::Inconclusive);
        assert_eq!(result.len(), 4);
    }
}
