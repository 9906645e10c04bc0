//! Grading of a single probe result. Both evaluators are built on these
//! functions; they differ only in how they sequence them.

use std::ops::ControlFlow;

use mxtls_common::{
    ClassifiedError, ProbeResult, TlsTestType,
    tls::{AlertDescription, CipherSuite, KeyExchange},
};

use crate::{
    Advisory, Judgment,
    advisory::catalogue::{
        DHE_UNSUPPORTED, ECDHE_UNSUPPORTED, INSECURE_DH_GROUP_SELECTED, SECURE_CURVE_SELECTED,
        SECURE_DH_GROUP_SELECTED, SSL3_DISABLED, SSL3_ENABLED, TLS10_DISABLED, TLS10_ENABLED,
        TLS11_DISABLED, TLS11_ENABLED, TLS12_CLIENT_PREFERENCE, TLS12_NO_FORWARD_SECRECY,
        TLS12_NON_AEAD_PREFERRED, TLS12_SERVER_PREFERENCE, TLS12_SHA1_SELECTED,
        TLS12_SHA2_SELECTED, TLS12_SUPPORTED, TLS12_UNSUPPORTED, TLS13_SUPPORTED,
        TLS13_UNSUPPORTED, TLS13_UNSUPPORTED_WITH_WEAKNESSES, WEAK_CURVE_SELECTED,
        WEAK_DH_GROUP_SELECTED, WEAK_SUITE_NOT_SELECTED, WEAK_SUITE_SELECTED,
        WEAK_SUITES_ACCEPTED, WEAK_SUITES_REFUSED,
    },
};

/// Alerts a server sends when it has nothing it is willing to negotiate.
const REFUSALS: &[AlertDescription] = &[
    AlertDescription::HandshakeFailure,
    AlertDescription::InsufficientSecurity,
    AlertDescription::ProtocolVersion,
];

/// Groups of 1024 bits or fewer are within reach of precomputation.
const INSECURE_DH_BITS: u16 = 1024;

/// What earlier assessments of the same run learned. Later assessments read
/// these instead of looking at earlier probe results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    /// Set by the TLS 1.2 assessments when they grade below pass.
    pub has_previous_failure: bool,
    /// No broadly used suite could be negotiated with TLS 1.2.
    pub tls12_unsupported: bool,
    /// The suite chosen from the best-first TLS 1.2 list.
    pub tls12_preferred_suite: Option<CipherSuite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub judgment: Judgment,
    pub flow: ControlFlow<()>,
}

impl Assessment {
    const fn proceed(judgment: Judgment) -> Self {
        Self {
            judgment,
            flow: ControlFlow::Continue(()),
        }
    }

    const fn conclude(judgment: Judgment) -> Self {
        Self {
            judgment,
            flow: ControlFlow::Break(()),
        }
    }
}

enum Outcome<'r> {
    Negotiated(CipherSuite, Option<&'r KeyExchange>),
    Refused(ClassifiedError),
    Unclassified(String),
}

fn outcome(result: &ProbeResult) -> Outcome<'_> {
    match (result.cipher_suite(), result.error()) {
        (Some(suite), None) => Outcome::Negotiated(suite, result.key_exchange()),
        (_, Some(error)) if error == ClassifiedError::ConnectionClosed || result.failed_with(REFUSALS) => {
            Outcome::Refused(error)
        }
        (_, Some(error)) => Outcome::Unclassified(match result.error_description() {
            Some(description) if !description.is_empty() => format!("{error}: {description}"),
            _ => error.to_string(),
        }),
        (None, None) => Outcome::Unclassified("no cipher suite was negotiated".to_owned()),
    }
}

/// Why a probe that failed for reasons unrelated to the server was not graded.
pub fn failure_reason(result: &ProbeResult) -> String {
    match (result.error(), result.error_description()) {
        (_, Some(description)) if !description.is_empty() => description.to_owned(),
        (Some(error), _) => error.to_string(),
        (None, _) => "no result".to_owned(),
    }
}

fn selected(suite: CipherSuite) -> Option<String> {
    Some(format!("Server selected {suite}"))
}

fn refused(error: ClassifiedError) -> Option<String> {
    Some(format!("Server answered with {error}"))
}

fn judge(test_type: TlsTestType, advisory: &Advisory, detail: Option<String>) -> Assessment {
    Assessment::proceed(Judgment::from_advisory(test_type, advisory, detail))
}

fn unclassified(test_type: TlsTestType, reason: String) -> Assessment {
    Assessment::proceed(Judgment::inconclusive(test_type, reason))
}

/// Grades one probe of the standard matrix.
pub fn assess(test_type: TlsTestType, result: &ProbeResult, findings: &mut Findings) -> Assessment {
    use TlsTestType as T;

    match test_type {
        T::Tls12AvailableWithBestCipherSuiteSelected => tls12_best(result, findings),
        T::Tls12AvailableWithBestCipherSuiteSelectedFromReverseList => tls12_reverse(result, findings),
        T::Tls12AvailableWithSha2HashFunctionSelected => tls12_sha2(result, findings),
        T::Tls12AvailableWithWeakCipherSuiteNotSelected => {
            let assessment = weak_not_selected(test_type, result, &WEAK_SUITES_REFUSED);
            if assessment.judgment.id == WEAK_SUITE_SELECTED.id {
                findings.has_previous_failure = true;
            }
            assessment
        }
        T::Tls11AvailableWithBestCipherSuiteSelected => {
            version_enabled(test_type, result, &TLS11_ENABLED, &TLS11_DISABLED)
        }
        T::Tls11AvailableWithWeakCipherSuiteNotSelected => {
            weak_not_selected(test_type, result, &TLS11_DISABLED)
        }
        T::Tls10AvailableWithBestCipherSuiteSelected => {
            version_enabled(test_type, result, &TLS10_ENABLED, &TLS10_DISABLED)
        }
        T::Tls10AvailableWithWeakCipherSuiteNotSelected => {
            weak_not_selected(test_type, result, &TLS10_DISABLED)
        }
        T::Ssl3FailsWithBadCipherSuite => {
            version_enabled(test_type, result, &SSL3_ENABLED, &SSL3_DISABLED)
        }
        T::TlsSecureEllipticCurveSelected => curve(result),
        T::TlsSecureDiffieHellmanGroupSelected => dh_group(result),
        T::TlsWeakCipherSuitesRejected => weak_only(result),
        T::Tls13AvailableWithBestCipherSuiteSelected => tls13(result, findings),
    }
}

fn tls12_best(result: &ProbeResult, findings: &mut Findings) -> Assessment {
    const TEST: TlsTestType = TlsTestType::Tls12AvailableWithBestCipherSuiteSelected;

    match outcome(result) {
        Outcome::Negotiated(suite, _) => {
            findings.tls12_preferred_suite = Some(suite);

            if !suite.is_forward_secret() {
                findings.has_previous_failure = true;
                judge(TEST, &TLS12_NO_FORWARD_SECRECY, selected(suite))
            } else if suite.is_aead() {
                judge(TEST, &TLS12_SUPPORTED, selected(suite))
            } else {
                judge(TEST, &TLS12_NON_AEAD_PREFERRED, selected(suite))
            }
        }
        Outcome::Refused(error) => {
            findings.tls12_unsupported = true;
            findings.has_previous_failure = true;
            Assessment::conclude(Judgment::from_advisory(TEST, &TLS12_UNSUPPORTED, refused(error)))
        }
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn tls12_reverse(result: &ProbeResult, findings: &mut Findings) -> Assessment {
    const TEST: TlsTestType = TlsTestType::Tls12AvailableWithBestCipherSuiteSelectedFromReverseList;

    match outcome(result) {
        Outcome::Negotiated(suite, _)
            if suite.is_forward_secret() || findings.tls12_preferred_suite == Some(suite) =>
        {
            judge(TEST, &TLS12_SERVER_PREFERENCE, selected(suite))
        }
        Outcome::Negotiated(suite, _) => {
            findings.has_previous_failure = true;
            judge(TEST, &TLS12_CLIENT_PREFERENCE, selected(suite))
        }
        Outcome::Refused(error) => unclassified(
            TEST,
            format!("Server refused a reordered list of suites it otherwise accepts ({error})"),
        ),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn tls12_sha2(result: &ProbeResult, findings: &mut Findings) -> Assessment {
    const TEST: TlsTestType = TlsTestType::Tls12AvailableWithSha2HashFunctionSelected;

    match outcome(result) {
        Outcome::Negotiated(suite, _) if suite.uses_sha2() || suite.is_aead() => {
            judge(TEST, &TLS12_SHA2_SELECTED, selected(suite))
        }
        Outcome::Negotiated(suite, _) => {
            findings.has_previous_failure = true;
            judge(TEST, &TLS12_SHA1_SELECTED, selected(suite))
        }
        Outcome::Refused(error) => unclassified(
            TEST,
            format!("Server refused every SHA-1 and SHA-2 suite ({error})"),
        ),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn weak_not_selected(test_type: TlsTestType, result: &ProbeResult, on_refusal: &Advisory) -> Assessment {
    match outcome(result) {
        Outcome::Negotiated(suite, _) if suite.is_weak() => {
            judge(test_type, &WEAK_SUITE_SELECTED, selected(suite))
        }
        Outcome::Negotiated(suite, _) => judge(test_type, &WEAK_SUITE_NOT_SELECTED, selected(suite)),
        Outcome::Refused(error) => judge(test_type, on_refusal, refused(error)),
        Outcome::Unclassified(reason) => unclassified(test_type, reason),
    }
}

fn version_enabled(
    test_type: TlsTestType,
    result: &ProbeResult,
    enabled: &Advisory,
    disabled: &Advisory,
) -> Assessment {
    match outcome(result) {
        Outcome::Negotiated(suite, _) => judge(test_type, enabled, selected(suite)),
        Outcome::Refused(error) => judge(test_type, disabled, refused(error)),
        Outcome::Unclassified(reason) => unclassified(test_type, reason),
    }
}

fn curve(result: &ProbeResult) -> Assessment {
    const TEST: TlsTestType = TlsTestType::TlsSecureEllipticCurveSelected;

    match outcome(result) {
        Outcome::Negotiated(suite, key_exchange) => match key_exchange.and_then(KeyExchange::curve) {
            Some(curve) if curve.is_secure() => {
                judge(TEST, &SECURE_CURVE_SELECTED, Some(format!("Server selected {curve}")))
            }
            Some(curve) => judge(TEST, &WEAK_CURVE_SELECTED, Some(format!("Server selected {curve}"))),
            None => unclassified(TEST, format!("Server selected {suite} without naming a curve")),
        },
        Outcome::Refused(error) => judge(TEST, &ECDHE_UNSUPPORTED, refused(error)),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn dh_group(result: &ProbeResult) -> Assessment {
    const TEST: TlsTestType = TlsTestType::TlsSecureDiffieHellmanGroupSelected;

    match outcome(result) {
        Outcome::Negotiated(suite, key_exchange) => match key_exchange.and_then(KeyExchange::dh_group) {
            Some(group) if group.is_secure() => {
                judge(TEST, &SECURE_DH_GROUP_SELECTED, Some(format!("Server used {group}")))
            }
            Some(group) if group.bits <= INSECURE_DH_BITS => {
                judge(TEST, &INSECURE_DH_GROUP_SELECTED, Some(format!("Server used {group}")))
            }
            Some(group) => judge(TEST, &WEAK_DH_GROUP_SELECTED, Some(format!("Server used {group}"))),
            None => unclassified(TEST, format!("Server selected {suite} without sending a group")),
        },
        Outcome::Refused(error) => judge(TEST, &DHE_UNSUPPORTED, refused(error)),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn weak_only(result: &ProbeResult) -> Assessment {
    const TEST: TlsTestType = TlsTestType::TlsWeakCipherSuitesRejected;

    match outcome(result) {
        Outcome::Negotiated(suite, _) => judge(TEST, &WEAK_SUITES_ACCEPTED, selected(suite)),
        Outcome::Refused(error) => judge(TEST, &WEAK_SUITES_REFUSED, refused(error)),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

fn tls13(result: &ProbeResult, findings: &Findings) -> Assessment {
    const TEST: TlsTestType = TlsTestType::Tls13AvailableWithBestCipherSuiteSelected;

    match outcome(result) {
        Outcome::Negotiated(suite, _) => judge(TEST, &TLS13_SUPPORTED, selected(suite)),
        Outcome::Refused(error) if findings.has_previous_failure => {
            judge(TEST, &TLS13_UNSUPPORTED_WITH_WEAKNESSES, refused(error))
        }
        Outcome::Refused(error) => judge(TEST, &TLS13_UNSUPPORTED, refused(error)),
        Outcome::Unclassified(reason) => unclassified(TEST, reason),
    }
}

#[cfg(test)]
mod tests {
    use mxtls_common::tls::{DhFamily, DhGroup, NamedGroup, TlsVersion};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Grade;

    fn negotiated(suite: CipherSuite, key_exchange: Option<KeyExchange>) -> ProbeResult {
        ProbeResult::negotiated(TlsVersion::Tls12, suite, key_exchange, Vec::new())
    }

    fn alert(alert: AlertDescription) -> ProbeResult {
        ProbeResult::failed(alert.into(), "")
    }

    fn grade(test_type: TlsTestType, result: &ProbeResult) -> Grade {
        assess(test_type, result, &mut Findings::default()).judgment.grade
    }

    #[test]
    fn test_static_rsa_warns_about_forward_secrecy() {
        let mut findings = Findings::default();
        let assessment = assess(
            TlsTestType::Tls12AvailableWithBestCipherSuiteSelected,
            &negotiated(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA, Some(KeyExchange::Rsa)),
            &mut findings,
        );

        assert_eq!(assessment.judgment.grade, Grade::Warning);
        assert_eq!(assessment.judgment.id, TLS12_NO_FORWARD_SECRECY.id);
        assert!(assessment.judgment.description.contains("Perfect Forward Secrecy"));
        assert_eq!(assessment.flow, ControlFlow::Continue(()));
        assert!(findings.has_previous_failure);
        assert_eq!(
            findings.tls12_preferred_suite,
            Some(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA)
        );
    }

    #[test]
    fn test_tls12_refusal_concludes() {
        let mut findings = Findings::default();
        let assessment = assess(
            TlsTestType::Tls12AvailableWithBestCipherSuiteSelected,
            &alert(AlertDescription::HandshakeFailure),
            &mut findings,
        );

        assert_eq!(assessment.judgment.grade, Grade::Fail);
        assert_eq!(assessment.flow, ControlFlow::Break(()));
        assert!(findings.tls12_unsupported);
    }

    #[test]
    fn test_weak_only_refusal_is_informational() {
        let assessment = assess(
            TlsTestType::TlsWeakCipherSuitesRejected,
            &alert(AlertDescription::HandshakeFailure),
            &mut Findings::default(),
        );

        assert_eq!(assessment.judgment.grade, Grade::Informational);
        assert_eq!(assessment.judgment.id, WEAK_SUITES_REFUSED.id);
        assert_eq!(assessment.flow, ControlFlow::Continue(()));
    }

    #[test]
    fn test_unexpected_alert_is_inconclusive() {
        assert_eq!(
            grade(
                TlsTestType::TlsWeakCipherSuitesRejected,
                &alert(AlertDescription::BadRecordMac)
            ),
            Grade::Inconclusive
        );
        assert_eq!(
            grade(TlsTestType::Ssl3FailsWithBadCipherSuite, &ProbeResult::default()),
            Grade::Inconclusive
        );
    }

    #[test]
    fn test_closed_connection_counts_as_refusal() {
        let closed = ProbeResult::failed(ClassifiedError::ConnectionClosed, "");
        assert_eq!(grade(TlsTestType::Ssl3FailsWithBadCipherSuite, &closed), Grade::Pass);
        assert_eq!(
            grade(TlsTestType::Tls10AvailableWithBestCipherSuiteSelected, &closed),
            Grade::Pass
        );
    }

    #[test]
    fn test_legacy_versions() {
        let cbc = negotiated(CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA, None);
        assert_eq!(
            grade(TlsTestType::Tls11AvailableWithBestCipherSuiteSelected, &cbc),
            Grade::Informational
        );
        assert_eq!(grade(TlsTestType::Ssl3FailsWithBadCipherSuite, &cbc), Grade::Fail);

        let rc4 = negotiated(CipherSuite::TLS_RSA_WITH_RC4_128_SHA, None);
        assert_eq!(
            grade(TlsTestType::Tls10AvailableWithWeakCipherSuiteNotSelected, &rc4),
            Grade::Fail
        );
        assert_eq!(
            grade(TlsTestType::Tls10AvailableWithWeakCipherSuiteNotSelected, &cbc),
            Grade::Pass
        );
    }

    #[test]
    fn test_curve_strength() {
        let ecdhe = |curve| {
            negotiated(
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
                Some(KeyExchange::Ecdhe {
                    curve,
                    signature: None,
                }),
            )
        };

        assert_eq!(
            grade(TlsTestType::TlsSecureEllipticCurveSelected, &ecdhe(NamedGroup::X25519)),
            Grade::Pass
        );
        assert_eq!(
            grade(TlsTestType::TlsSecureEllipticCurveSelected, &ecdhe(NamedGroup::SECP160K1)),
            Grade::Warning
        );
        assert_eq!(
            grade(
                TlsTestType::TlsSecureEllipticCurveSelected,
                &alert(AlertDescription::HandshakeFailure)
            ),
            Grade::Informational
        );
    }

    #[test]
    fn test_dh_group_strength() {
        let dhe = |bits, family| {
            negotiated(
                CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256,
                Some(KeyExchange::Dhe {
                    group: DhGroup { bits, family },
                    signature: None,
                }),
            )
        };
        let test = TlsTestType::TlsSecureDiffieHellmanGroupSelected;

        assert_eq!(grade(test, &dhe(2048, DhFamily::Ffdhe)), Grade::Pass);
        assert_eq!(grade(test, &dhe(1536, DhFamily::Modp)), Grade::Warning);
        assert_eq!(grade(test, &dhe(1024, DhFamily::Custom)), Grade::Fail);
        assert_eq!(
            grade(test, &negotiated(CipherSuite::TLS_DHE_RSA_WITH_AES_128_GCM_SHA256, None)),
            Grade::Inconclusive
        );
    }

    #[test]
    fn test_tls13_reads_previous_failure() {
        let refused = alert(AlertDescription::ProtocolVersion);
        let test = TlsTestType::Tls13AvailableWithBestCipherSuiteSelected;

        assert_eq!(
            assess(test, &refused, &mut Findings::default()).judgment.id,
            TLS13_UNSUPPORTED.id
        );

        let mut findings = Findings {
            has_previous_failure: true,
            ..Findings::default()
        };
        let assessment = assess(test, &refused, &mut findings);
        assert_eq!(assessment.judgment.id, TLS13_UNSUPPORTED_WITH_WEAKNESSES.id);
        assert_eq!(assessment.judgment.grade, Grade::Warning);
    }

    #[test]
    fn test_reverse_list_uses_the_preferred_suite() {
        let rsa = negotiated(CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256, None);
        let test = TlsTestType::Tls12AvailableWithBestCipherSuiteSelectedFromReverseList;

        let mut findings = Findings::default();
        assert_eq!(assess(test, &rsa, &mut findings).judgment.id, TLS12_CLIENT_PREFERENCE.id);
        assert!(findings.has_previous_failure);

        let mut findings = Findings {
            tls12_preferred_suite: Some(CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256),
            ..Findings::default()
        };
        assert_eq!(assess(test, &rsa, &mut findings).judgment.id, TLS12_SERVER_PREFERENCE.id);
    }
}
