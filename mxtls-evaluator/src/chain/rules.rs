use std::ops::ControlFlow;

use mxtls_common::{ProbeResult, TlsTestType};

use super::ChainRule;
use crate::{TestContext, assess::assess};

macro_rules! chain_rules {
    ($( $(#[$meta:meta])* $rule:ident => $test_type:ident; )+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $rule;

            impl ChainRule for $rule {
                fn test_type(&self) -> TlsTestType {
                    TlsTestType::$test_type
                }

                fn evaluate(&self, context: &mut TestContext, result: &ProbeResult) -> ControlFlow<()> {
                    let assessment = assess(TlsTestType::$test_type, result, &mut context.findings);
                    context.record(assessment.judgment);
                    assessment.flow
                }
            }
        )+
    };
}

chain_rules! {
    /// Stops the chain when TLS 1.2 cannot be negotiated at all.
    Tls12BestSuite => Tls12AvailableWithBestCipherSuiteSelected;
    Tls12ServerPreference => Tls12AvailableWithBestCipherSuiteSelectedFromReverseList;
    Tls12Sha2Suite => Tls12AvailableWithSha2HashFunctionSelected;
    Tls12WeakSuiteNotSelected => Tls12AvailableWithWeakCipherSuiteNotSelected;
    Tls11Enabled => Tls11AvailableWithBestCipherSuiteSelected;
    Tls11WeakSuiteNotSelected => Tls11AvailableWithWeakCipherSuiteNotSelected;
    Tls10Enabled => Tls10AvailableWithBestCipherSuiteSelected;
    Tls10WeakSuiteNotSelected => Tls10AvailableWithWeakCipherSuiteNotSelected;
    Ssl3Enabled => Ssl3FailsWithBadCipherSuite;
    SecureCurve => TlsSecureEllipticCurveSelected;
    SecureDhGroup => TlsSecureDiffieHellmanGroupSelected;
    /// A refusal here is the good outcome and never stops the chain.
    WeakSuitesRejected => TlsWeakCipherSuitesRejected;
    /// Reads `has_previous_failure`, which only the TLS 1.2 rules set.
    Tls13Supported => Tls13AvailableWithBestCipherSuiteSelected;
}
