use std::fmt;

use serde::{Deserialize, Serialize};

/// How one tested feature came out, ordered from best to worst.
///
/// `Inconclusive` sorts above `Fail` so that folding a set of judgments with
/// `max` never hides the fact that something could not be classified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Pass,
    Informational,
    Warning,
    Fail,
    Inconclusive,
    #[default]
    Unknown,
}

impl Grade {
    #[must_use]
    pub fn is_worse_than(self, other: Self) -> bool {
        self > other
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Informational => "INFORMATIONAL",
            Self::Warning => "WARNING",
            Self::Fail => "FAIL",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
