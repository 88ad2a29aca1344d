//! Classifier tables: per-sequence label predictions and per-label weights.
//!
//! Tables are built once, validated here, and only read afterwards. The
//! decision code never repairs them.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::{
    error::{EnsembleError, EnsembleResult},
    prediction::NA_LABEL,
};

/// Weight used for labels missing from a classifier's weight table.
pub const DEFAULT_WEIGHT: f64 = 0.0;

/// Sentinel some weight sources use for "no measurement".
const UNMEASURED_WEIGHT: f64 = -1.0;

/// Normalizes a numeric weight. `-1` (unmeasured) maps to 0; other negative
/// or non-finite values are rejected.
#[must_use]
pub fn normalize_weight(value: f64) -> Option<f64> {
    if value == UNMEASURED_WEIGHT {
        Some(DEFAULT_WEIGHT)
    } else if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Parses a textual weight token. `NA`, `0` and `-1.000` all mean 0.000.
#[must_use]
pub fn parse_weight(raw: &str) -> Option<f64> {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("NA") {
        return Some(DEFAULT_WEIGHT);
    }
    token.parse::<f64>().ok().and_then(normalize_weight)
}

/// Label -> confidence weight for one classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl WeightTable {
    /// Weight recorded for the label, if any.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.weights.get(label).copied()
    }

    /// Weight for the label, falling back to [`DEFAULT_WEIGHT`] when missing.
    #[must_use]
    pub fn weight_or_default(&self, label: &str) -> f64 {
        self.get(label).unwrap_or(DEFAULT_WEIGHT)
    }

    /// Number of labels with an explicit weight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when no weight was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates weights in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(label, weight)| (label.as_str(), *weight))
    }

    fn insert(&mut self, label: String, weight: f64) {
        self.weights.insert(label, weight);
    }
}

/// One upstream predictor: which labels it proposed for which sequences, and
/// how much each label is trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    name: String,
    predictions: IndexMap<String, IndexSet<String>>,
    weights: WeightTable,
}

impl Classifier {
    /// Creates a classifier without predictions or weights.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predictions: IndexMap::new(),
            weights: WeightTable::default(),
        }
    }

    /// Classifier name as reported in traces.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records labels for a sequence. Calling it again for the same sequence
    /// appends; repeated labels keep their first position. An empty label
    /// list still marks the sequence as listed.
    pub fn record<I, S>(&mut self, sequence_id: impl Into<String>, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predictions
            .entry(sequence_id.into())
            .or_default()
            .extend(labels.into_iter().map(Into::into));
    }

    /// Builder form of [`Classifier::record`].
    #[must_use]
    pub fn with_prediction<I, S>(mut self, sequence_id: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record(sequence_id, labels);
        self
    }

    /// Sets a numeric weight for a label.
    pub fn set_weight(&mut self, label: impl Into<String>, weight: f64) -> EnsembleResult<()> {
        let label = label.into();
        let Some(weight) = normalize_weight(weight) else {
            return Err(self.invalid_weight(label, weight.to_string()));
        };
        self.weights.insert(label, weight);
        Ok(())
    }

    /// Sets a weight from its textual form (`"0.952"`, `"NA"`, `"-1.000"`).
    pub fn set_raw_weight(&mut self, label: impl Into<String>, raw: &str) -> EnsembleResult<()> {
        let label = label.into();
        let Some(weight) = parse_weight(raw) else {
            return Err(self.invalid_weight(label, raw.to_string()));
        };
        self.weights.insert(label, weight);
        Ok(())
    }

    /// Builder form of [`Classifier::set_weight`].
    pub fn with_weight(mut self, label: impl Into<String>, weight: f64) -> EnsembleResult<Self> {
        self.set_weight(label, weight)?;
        Ok(self)
    }

    /// Labels proposed for a sequence; `None` means the classifier abstained.
    #[must_use]
    pub fn labels_for(&self, sequence_id: &str) -> Option<&IndexSet<String>> {
        self.predictions.get(sequence_id)
    }

    /// True when the classifier listed the sequence and proposed the label.
    #[must_use]
    pub fn proposes(&self, sequence_id: &str, label: &str) -> bool {
        self.labels_for(sequence_id)
            .is_some_and(|labels| labels.contains(label))
    }

    /// Weight for a label, 0.000 when the table has no entry.
    #[must_use]
    pub fn weight(&self, label: &str) -> f64 {
        self.weights.weight_or_default(label)
    }

    /// The classifier's weight table.
    #[must_use]
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Sequence IDs this classifier listed, in recording order.
    pub fn sequence_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.predictions.keys().map(String::as_str)
    }

    fn invalid_weight(&self, label: String, raw: String) -> EnsembleError {
        EnsembleError::InvalidWeight {
            classifier: self.name.clone(),
            label,
            raw,
        }
    }
}

/// Ordered set of classifiers taking part in a run. Order is registration
/// order and determines trace order in results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierRoster {
    classifiers: Vec<Classifier>,
}

impl ClassifierRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a classifier, rejecting blank or duplicate names and predictions
    /// that use the NA sentinel as a label.
    pub fn register(&mut self, classifier: Classifier) -> EnsembleResult<()> {
        if classifier.name.trim().is_empty() {
            return Err(EnsembleError::EmptyClassifierName);
        }
        if let Some((sequence_id, _)) = classifier
            .predictions
            .iter()
            .find(|(_, labels)| labels.contains(NA_LABEL))
        {
            return Err(EnsembleError::ReservedLabel {
                classifier: classifier.name.clone(),
                sequence_id: sequence_id.clone(),
            });
        }
        if self.get(&classifier.name).is_some() {
            return Err(EnsembleError::DuplicateClassifier(classifier.name));
        }
        self.classifiers.push(classifier);
        Ok(())
    }

    /// Builds a roster from classifiers in the given order.
    pub fn from_classifiers(
        classifiers: impl IntoIterator<Item = Classifier>,
    ) -> EnsembleResult<Self> {
        let mut roster = Self::new();
        for classifier in classifiers {
            roster.register(classifier)?;
        }
        Ok(roster)
    }

    /// Parses a roster document:
    /// `{"BLAST": {"predictions": {"Q1": ["EF1"]}, "weights": {"EF1": 0.8}}}`.
    ///
    /// Both tables are required. Weights may be numbers or weight-file tokens.
    pub fn from_json_str(raw: &str) -> EnsembleResult<Self> {
        let document: IndexMap<String, ClassifierDocument> = serde_json::from_str(raw)?;
        let mut roster = Self::new();
        for (name, entry) in document {
            let mut classifier = Classifier::new(name);
            for (sequence_id, labels) in entry.predictions {
                classifier.record(sequence_id, labels);
            }
            for (label, weight) in entry.weights {
                match weight {
                    RawWeight::Number(value) => classifier.set_weight(label, value)?,
                    RawWeight::Text(text) => classifier.set_raw_weight(label, &text)?,
                }
            }
            roster.register(classifier)?;
        }
        Ok(roster)
    }

    /// Looks a classifier up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Classifier> {
        self.classifiers.iter().find(|c| c.name == name)
    }

    /// Iterates classifiers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Classifier> + '_ {
        self.classifiers.iter()
    }

    /// Number of classifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    /// True when no classifier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Every sequence ID listed by at least one classifier, sorted.
    #[must_use]
    pub fn sequence_ids(&self) -> BTreeSet<String> {
        self.classifiers
            .iter()
            .flat_map(Classifier::sequence_ids)
            .map(str::to_owned)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassifierDocument {
    predictions: IndexMap<String, Vec<String>>,
    weights: IndexMap<String, RawWeight>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawWeight {
    Number(f64),
    Text(String),
}
