use crate::{Advisory, EvaluationResult, Judgment, assess::Findings};

/// State carried through one run of the rule chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestContext {
    advisories: Vec<Advisory>,
    judgments: Vec<Judgment>,
    /// Something went wrong that says nothing about the server, the run's
    /// advisories must not be published.
    pub inconclusive: bool,
    /// Index of the rule being, or last, evaluated.
    pub cursor: usize,
    pub findings: Findings,
}

impl TestContext {
    /// Appends a judgment and raises its advisory once.
    pub fn record(&mut self, judgment: Judgment) {
        if let Some(advisory) = judgment.advisory()
            && !self.advisories.contains(advisory)
        {
            self.advisories.push(*advisory);
        }
        self.judgments.push(judgment);
    }

    /// Records a judgment that poisons the whole run.
    pub fn mark_inconclusive(&mut self, judgment: Judgment) {
        self.inconclusive = true;
        self.record(judgment);
    }

    /// Everything raised so far, even for an inconclusive run.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// The advisories to publish, `None` once the run is inconclusive.
    pub fn published_advisories(&self) -> Option<&[Advisory]> {
        (!self.inconclusive).then_some(self.advisories.as_slice())
    }

    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    pub fn into_result(self) -> EvaluationResult {
        EvaluationResult::new(self.judgments)
    }
}

#[cfg(test)]
mod tests {
    use mxtls_common::TlsTestType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::advisory::catalogue;

    #[test]
    fn test_advisories_are_deduplicated() {
        let mut context = TestContext::default();
        for test_type in [
            TlsTestType::Tls11AvailableWithBestCipherSuiteSelected,
            TlsTestType::Tls11AvailableWithWeakCipherSuiteNotSelected,
        ] {
            context.record(Judgment::from_advisory(test_type, &catalogue::TLS11_DISABLED, None));
        }

        assert_eq!(context.judgments().len(), 2);
        assert_eq!(context.advisories(), [catalogue::TLS11_DISABLED]);
        assert_eq!(
            context.published_advisories(),
            Some([catalogue::TLS11_DISABLED].as_slice())
        );
    }

    #[test]
    fn test_inconclusive_withholds_advisories() {
        let mut context = TestContext::default();
        context.record(Judgment::from_advisory(
            TlsTestType::Tls13AvailableWithBestCipherSuiteSelected,
            &catalogue::TLS13_SUPPORTED,
            None,
        ));
        context.mark_inconclusive(Judgment::inconclusive(
            TlsTestType::TlsSecureEllipticCurveSelected,
            "tcp_connection_failed",
        ));

        assert_eq!(context.advisories().len(), 1);
        assert_eq!(context.published_advisories(), None);
    }
}
