use mxtls_common::TlsTestType;
use serde::Serialize;
use uuid::Uuid;

use crate::{Advisory, Grade, advisory::catalogue};

/// The graded outcome of one tested feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgment {
    pub test_type: TlsTestType,
    /// The advisory this judgment raises.
    pub id: Uuid,
    pub grade: Grade,
    pub description: String,
}

impl Judgment {
    /// Graded by the advisory's severity. `detail` leads the description
    /// when there is something specific to say.
    pub fn from_advisory(test_type: TlsTestType, advisory: &Advisory, detail: Option<String>) -> Self {
        let description = match detail {
            Some(detail) => format!("{detail}. {}", advisory.text),
            None => advisory.text.to_owned(),
        };

        Self {
            test_type,
            id: advisory.id,
            grade: advisory.grade(),
            description,
        }
    }

    pub fn inconclusive(test_type: TlsTestType, description: impl Into<String>) -> Self {
        Self {
            test_type,
            id: catalogue::UNCLASSIFIED_RESULT.id,
            grade: Grade::Inconclusive,
            description: description.into(),
        }
    }

    /// The advisory to publish, if this judgment is gradeable.
    pub fn advisory(&self) -> Option<&'static Advisory> {
        if self.grade == Grade::Inconclusive {
            return None;
        }
        catalogue::by_id(self.id)
    }
}

/// Judgments in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    judgments: Vec<Judgment>,
}

impl EvaluationResult {
    pub const fn new(judgments: Vec<Judgment>) -> Self {
        Self { judgments }
    }

    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    /// Every judgment produced for `test_type`.
    pub fn get(&self, test_type: TlsTestType) -> impl Iterator<Item = &Judgment> {
        self.judgments
            .iter()
            .filter(move |judgment| judgment.test_type == test_type)
    }

    /// The worst grade overall, `None` when nothing was judged.
    pub fn worst(&self) -> Option<Grade> {
        self.judgments.iter().map(|judgment| judgment.grade).max()
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Distinct advisories in first-raised order.
    pub fn advisories(&self) -> Vec<Advisory> {
        let mut advisories: Vec<Advisory> = Vec::new();
        for advisory in self.judgments.iter().filter_map(Judgment::advisory) {
            if !advisories.contains(advisory) {
                advisories.push(*advisory);
            }
        }
        advisories
    }
}

impl IntoIterator for EvaluationResult {
    type Item = Judgment;
    type IntoIter = std::vec::IntoIter<Judgment>;

    fn into_iter(self) -> Self::IntoIter {
        self.judgments.into_iter()
    }
}

impl FromIterator<Judgment> for EvaluationResult {
    fn from_iter<I: IntoIterator<Item = Judgment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
