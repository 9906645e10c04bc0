use mxtls_common::{ProbeResult, TlsTestType};

use super::{Evaluator, Rule};
use crate::{
    Grade, Judgment, ProbeMatrix,
    assess::{Findings, assess, failure_reason},
};

/// Grades one probe of the matrix under a feature category.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRule {
    pub category: &'static str,
    pub test_type: TlsTestType,
    pub stop: bool,
}

impl ProbeRule {
    pub const fn new(category: &'static str, test_type: TlsTestType) -> Self {
        Self {
            category,
            test_type,
            stop: false,
        }
    }

    pub const fn stopping(mut self) -> Self {
        self.stop = true;
        self
    }
}

fn is_conclusive(result: &ProbeResult) -> bool {
    !result.error().is_some_and(|error| error.is_inconclusive())
}

/// What the probes ahead of `test_type` in matrix order tell us.
fn findings_before(matrix: &ProbeMatrix, test_type: TlsTestType) -> Findings {
    let mut findings = Findings::default();

    for earlier in TlsTestType::ALL.iter().take_while(|earlier| **earlier != test_type) {
        if let Some(result) = matrix.get(earlier).filter(|result| is_conclusive(result)) {
            assess(*earlier, result, &mut findings);
        }
    }

    findings
}

impl Rule<ProbeMatrix> for ProbeRule {
    fn category(&self) -> &'static str {
        self.category
    }

    fn is_stop_rule(&self) -> bool {
        self.stop
    }

    fn evaluate(&self, matrix: &ProbeMatrix) -> Vec<Judgment> {
        let judgment = match matrix.get(&self.test_type) {
            None => Judgment::inconclusive(self.test_type, "Test was not run"),
            Some(result) if !is_conclusive(result) => {
                Judgment::inconclusive(self.test_type, failure_reason(result))
            }
            Some(result) => {
                let mut findings = findings_before(matrix, self.test_type);
                assess(self.test_type, result, &mut findings).judgment
            }
        };

        vec![judgment]
    }
}

/// One category per feature group.
pub fn standard_rules() -> Vec<Box<dyn Rule<ProbeMatrix>>> {
    use TlsTestType as T;

    [
        ProbeRule::new("tls13", T::Tls13AvailableWithBestCipherSuiteSelected),
        ProbeRule::new("tls12", T::Tls12AvailableWithBestCipherSuiteSelected).stopping(),
        ProbeRule::new("tls12", T::Tls12AvailableWithBestCipherSuiteSelectedFromReverseList),
        ProbeRule::new("tls12", T::Tls12AvailableWithSha2HashFunctionSelected),
        ProbeRule::new("tls12", T::Tls12AvailableWithWeakCipherSuiteNotSelected),
        ProbeRule::new("tls11", T::Tls11AvailableWithBestCipherSuiteSelected).stopping(),
        ProbeRule::new("tls11", T::Tls11AvailableWithWeakCipherSuiteNotSelected),
        ProbeRule::new("tls10", T::Tls10AvailableWithBestCipherSuiteSelected).stopping(),
        ProbeRule::new("tls10", T::Tls10AvailableWithWeakCipherSuiteNotSelected),
        ProbeRule::new("ssl3", T::Ssl3FailsWithBadCipherSuite),
        ProbeRule::new("curves", T::TlsSecureEllipticCurveSelected),
        ProbeRule::new("dh_groups", T::TlsSecureDiffieHellmanGroupSelected),
        ProbeRule::new("weak_suites", T::TlsWeakCipherSuitesRejected),
    ]
    .into_iter()
    .map(|rule| Box::new(rule) as Box<dyn Rule<ProbeMatrix>>)
    .collect()
}

/// Failures that make the rest of a feature group meaningless. Warnings and
/// notes still let the category continue.
pub fn is_disqualifying(judgment: &Judgment) -> bool {
    judgment.grade >= Grade::Fail
}

impl Evaluator<ProbeMatrix> {
    pub fn standard() -> Self {
        Self::new(standard_rules())
    }

    /// Evaluates the standard matrix, stopping categories only on
    /// disqualifying judgments.
    pub fn grade(&self, matrix: &ProbeMatrix) -> crate::EvaluationResult {
        self.evaluate_with(matrix, is_disqualifying)
    }
}

#[cfg(test)]
mod tests {
    use mxtls_common::{
        ClassifiedError,
        tls::{AlertDescription, CipherSuite, TlsVersion},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::advisory::catalogue;

    fn negotiated(version: TlsVersion, suite: CipherSuite) -> ProbeResult {
        ProbeResult::negotiated(version, suite, None, Vec::new())
    }

    fn refused() -> ProbeResult {
        ProbeResult::failed(AlertDescription::HandshakeFailure.into(), "")
    }

    #[test]
    fn test_tls12_refusal_only_stops_its_category() {
        let mut matrix: ProbeMatrix = TlsTestType::ALL
            .iter()
            .map(|test_type| (*test_type, refused()))
            .collect();
        matrix.insert(
            TlsTestType::Tls13AvailableWithBestCipherSuiteSelected,
            negotiated(TlsVersion::Tls13, CipherSuite::TLS_AES_128_GCM_SHA256),
        );

        let result = Evaluator::standard().grade(&matrix);

        let tls12: Vec<&Judgment> = TlsTestType::ALL[..4]
            .iter()
            .flat_map(|test_type| result.get(*test_type))
            .collect();
        assert_eq!(tls12.len(), 1);
        assert_eq!(tls12[0].id, catalogue::TLS12_UNSUPPORTED.id);

        // Every other feature group still reports.
        assert_eq!(result.len(), 13 - 3);
        assert_eq!(
            result
                .get(TlsTestType::Tls13AvailableWithBestCipherSuiteSelected)
                .map(|judgment| judgment.id)
                .collect::<Vec<_>>(),
            vec![catalogue::TLS13_SUPPORTED.id]
        );
        assert_eq!(
            result
                .get(TlsTestType::TlsWeakCipherSuitesRejected)
                .map(|judgment| judgment.grade)
                .collect::<Vec<_>>(),
            vec![Grade::Informational]
        );
    }

    #[test]
    fn test_tls13_sees_tls12_weaknesses() {
        let mut matrix = ProbeMatrix::new();
        matrix.insert(
            TlsTestType::Tls12AvailableWithBestCipherSuiteSelected,
            negotiated(TlsVersion::Tls12, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA),
        );
        matrix.insert(TlsTestType::Tls13AvailableWithBestCipherSuiteSelected, refused());

        let result = Evaluator::standard().grade(&matrix);

        assert_eq!(
            result
                .get(TlsTestType::Tls13AvailableWithBestCipherSuiteSelected)
                .map(|judgment| judgment.id)
                .collect::<Vec<_>>(),
            vec![catalogue::TLS13_UNSUPPORTED_WITH_WEAKNESSES.id]
        );
    }

    #[test]
    fn test_connectivity_failure_is_inconclusive() {
        let mut matrix = ProbeMatrix::new();
        matrix.insert(
            TlsTestType::Ssl3FailsWithBadCipherSuite,
            ProbeResult::failed(ClassifiedError::HostNotFound, "no such host"),
        );

        let result = Evaluator::standard().grade(&matrix);

        let ssl3: Vec<&Judgment> = result.get(TlsTestType::Ssl3FailsWithBadCipherSuite).collect();
        assert_eq!(ssl3.len(), 1);
        assert_eq!(ssl3[0].grade, Grade::Inconclusive);
        assert_eq!(ssl3[0].description, "no such host");
    }
}
