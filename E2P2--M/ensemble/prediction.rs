use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Sentinel label for sequences without a confident call.
pub const NA_LABEL: &str = "NA";

/// One label of a final call, with its score for weight-based schemes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionEntry {
    /// Called label.
    pub label: String,
    /// Aggregated score; absent for count-based schemes and NA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl PredictionEntry {
    /// Entry without a score.
    #[must_use]
    pub fn bare(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score: None,
        }
    }

    /// Entry carrying its score.
    #[must_use]
    pub fn scored(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score: Some(score),
        }
    }

    /// The NA sentinel entry.
    #[must_use]
    pub fn na() -> Self {
        Self::bare(NA_LABEL)
    }
}

impl fmt::Display for PredictionEntry {
    /// `label` or `label (score)`, score in shortest round-trip form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.score {
            Some(score) => write!(f, "{} ({score:?})", self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// Final call for one sequence plus the per-classifier trace used by reports.
///
/// The entry list is never empty, holds each label once, and contains the NA
/// sentinel only as its sole entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalPrediction {
    sequence_id: String,
    entries: Vec<PredictionEntry>,
    classifiers: IndexMap<String, Vec<String>>,
}

impl FinalPrediction {
    /// NA call.
    #[must_use]
    pub fn na(sequence_id: impl Into<String>, classifiers: IndexMap<String, Vec<String>>) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            entries: vec![PredictionEntry::na()],
            classifiers,
        }
    }

    /// Call with the given entries. Repeated labels keep their first entry;
    /// an empty list or any NA entry collapses the call to NA.
    #[must_use]
    pub fn called(
        sequence_id: impl Into<String>,
        entries: impl IntoIterator<Item = PredictionEntry>,
        classifiers: IndexMap<String, Vec<String>>,
    ) -> Self {
        let mut seen = IndexSet::new();
        let entries: Vec<PredictionEntry> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.label.clone()))
            .collect();
        if entries.is_empty() || seen.contains(NA_LABEL) {
            return Self::na(sequence_id, classifiers);
        }
        Self {
            sequence_id: sequence_id.into(),
            entries,
            classifiers,
        }
    }

    /// Sequence the call belongs to.
    #[must_use]
    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    /// Ordered entries; the winner comes first.
    #[must_use]
    pub fn entries(&self) -> &[PredictionEntry] {
        &self.entries
    }

    /// Label text of every entry, score suffix stripped.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    /// Classifier name -> raw entries, for every classifier that listed the sequence.
    #[must_use]
    pub fn classifiers(&self) -> &IndexMap<String, Vec<String>> {
        &self.classifiers
    }

    /// True for the NA call.
    #[must_use]
    pub fn is_na(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].label == NA_LABEL
    }

    /// True when more than one label was retained.
    #[must_use]
    pub fn is_multi_function(&self) -> bool {
        self.entries.len() > 1
    }
}
