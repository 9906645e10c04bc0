use std::collections::BTreeMap;

use async_trait::async_trait;
use mxtls_common::{ProbeResult, TestCriteria, config::ProbeTimeouts, internal};
use mxtls_evaluator::{EvaluationResult, Evaluator, ProbeMatrix, RuleChain, TestContext};
use mxtls_probe::TlsProbeClient;
use mxtls_smtp::SmtpConfig;
use mxtls_tracing::traced;

use crate::{CertificateCache, Result, SimplifiedTlsConnectionResult, TestRunMessage};

/// Everything one target's run produced.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub target: String,
    /// In the order the probes ran.
    pub results: Vec<(TestCriteria, ProbeResult)>,
    /// The rule chain's verdict, which decides what is published.
    pub context: TestContext,
    /// Per feature group grading of the same results.
    pub evaluation: EvaluationResult,
}

impl TestRun {
    pub const fn is_inconclusive(&self) -> bool {
        self.context.inconclusive
    }

    /// The message published for this run. Certificates are taken from the
    /// batch's cache, so they must have been recorded there first.
    pub fn to_message(&self, cache: &CertificateCache) -> TestRunMessage {
        let mut certificates = BTreeMap::new();

        let results = self
            .results
            .iter()
            .map(|(criteria, result)| {
                let thumbprints: Vec<String> = result
                    .certificates()
                    .iter()
                    .map(|der| cache.insert(der))
                    .collect();
                certificates.extend(cache.select(&thumbprints));

                SimplifiedTlsConnectionResult {
                    test_name: criteria.name.clone(),
                    cipher_suite: result.cipher_suite().map(|suite| suite.to_string()),
                    certificate_thumbprints: thumbprints,
                    error: result.error().map(|error| error.to_string()),
                    error_description: result.error_description().map(ToOwned::to_owned),
                    smtp_handshake: result.smtp_transcript().to_vec(),
                }
            })
            .collect();

        TestRunMessage::new(
            self.target.clone(),
            self.context.published_advisories().map(<[_]>::to_vec),
            results,
            certificates,
        )
    }
}

/// Runs the whole probe matrix against one target.
#[async_trait]
pub trait TargetTester: Send + Sync {
    async fn run(&self, target: &str, cache: &CertificateCache) -> Result<TestRun>;
}

/// Probes a target with every criteria in turn, one connection at a time,
/// and grades the results.
pub struct SecurityTester {
    client: TlsProbeClient,
    port: u16,
    criteria: Vec<TestCriteria>,
    chain: RuleChain,
    evaluator: Evaluator<ProbeMatrix>,
}

impl SecurityTester {
    /// The standard matrix, chain and rule set.
    pub fn new(smtp: SmtpConfig, timeouts: ProbeTimeouts) -> Self {
        Self::with_criteria(smtp, timeouts, TestCriteria::standard_set())
    }

    pub fn with_criteria(smtp: SmtpConfig, timeouts: ProbeTimeouts, criteria: Vec<TestCriteria>) -> Self {
        Self {
            port: smtp.port,
            client: TlsProbeClient::new(smtp, timeouts),
            criteria,
            chain: RuleChain::standard(),
            evaluator: Evaluator::standard(),
        }
    }

    pub fn criteria(&self) -> &[TestCriteria] {
        &self.criteria
    }

    /// Grades results that were already collected.
    pub fn grade(&self, target: &str, results: Vec<(TestCriteria, ProbeResult)>) -> TestRun {
        let matrix: ProbeMatrix = results
            .iter()
            .map(|(criteria, result)| (criteria.test_type, result.clone()))
            .collect();

        TestRun {
            target: target.to_owned(),
            context: self.chain.evaluate(&matrix),
            evaluation: self.evaluator.grade(&matrix),
            results,
        }
    }
}

#[async_trait]
impl TargetTester for SecurityTester {
    async fn run(&self, target: &str, cache: &CertificateCache) -> Result<TestRun> {
        Ok(self.grade(target, self.probe_all(target, cache).await))
    }
}

impl SecurityTester {
    #[traced(instrument(level = tracing::Level::INFO, skip_all, fields(target = %target)), timing(precision = "s"))]
    async fn probe_all(&self, target: &str, cache: &CertificateCache) -> Vec<(TestCriteria, ProbeResult)> {
        let mut results = Vec::with_capacity(self.criteria.len());

        for criteria in &self.criteria {
            let result = self.client.probe(criteria, target, self.port).await;
            for der in result.certificates() {
                cache.insert(der);
            }

            internal!(
                level = DEBUG,
                "{target} {}: {}",
                criteria.name,
                result
                    .cipher_suite()
                    .map_or_else(|| format!("{:?}", result.error()), |suite| suite.to_string())
            );
            results.push((criteria.clone(), result));
        }

        results
    }
}
