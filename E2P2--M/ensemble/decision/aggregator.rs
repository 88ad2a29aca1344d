use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierRoster;

/// How classifier votes for one sequence are turned into per-label scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Number of classifiers proposing the label.
    Count,
    /// Best weight among the classifiers proposing the label.
    MaxWeight,
    /// Summed weight divided by every vote cast for the sequence.
    AverageGlobal,
    /// Summed weight divided by the votes cast for that label.
    AveragePerLabel,
    /// Summed weight minus the weight of every classifier that did not
    /// propose the label, halved.
    Binary,
}

impl AggregationMode {
    /// True when scores are vote counts rather than weights.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count)
    }
}

/// A single classifier's assertion that a sequence carries a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote<'a> {
    /// Classifier casting the vote.
    pub classifier: &'a str,
    /// Proposed label.
    pub label: &'a str,
    /// Classifier weight for the label (0.000 when unknown).
    pub weight: f64,
}

/// Per-label scores for one sequence under one aggregation mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreTable {
    scores: BTreeMap<String, f64>,
    total_votes: usize,
}

impl ScoreTable {
    /// Score of a label, if it was proposed.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.scores.get(label).copied()
    }

    /// Number of distinct labels proposed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// True when nothing was proposed for the sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of (classifier, label) votes cast for the sequence.
    #[must_use]
    pub const fn total_votes(&self) -> usize {
        self.total_votes
    }

    /// Scores in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.scores.iter().map(|(label, score)| (label.as_str(), *score))
    }
}

/// Scores plus what each classifier said, for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Aggregated scores.
    pub table: ScoreTable,
    /// Classifier name -> raw entries (`label` or `label (weight)`), roster order.
    pub trace: IndexMap<String, Vec<String>>,
}

/// Turns one sequence's classifier predictions into a [`ScoreTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAggregator {
    mode: AggregationMode,
}

impl ScoreAggregator {
    /// Creates an aggregator for the given mode.
    #[must_use]
    pub const fn new(mode: AggregationMode) -> Self {
        Self { mode }
    }

    /// Mode in use.
    #[must_use]
    pub const fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Scores every label proposed for `sequence_id`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aggregate(&self, sequence_id: &str, roster: &ClassifierRoster) -> Aggregation {
        let votes = collect_votes(sequence_id, roster);
        let total_votes = votes.len();
        let scores = match self.mode {
            AggregationMode::Count => tally(&votes, |score, _| *score += 1.0),
            AggregationMode::MaxWeight => tally(&votes, |score, weight| {
                *score = score.max(weight);
            }),
            AggregationMode::AverageGlobal => {
                let mut sums = tally(&votes, |score, weight| *score += weight);
                // total_votes > 0 whenever sums has entries.
                let denominator = total_votes as f64;
                sums.values_mut().for_each(|sum| *sum /= denominator);
                sums
            }
            AggregationMode::AveragePerLabel => {
                let mut sums = tally(&votes, |score, weight| *score += weight);
                let counts = tally(&votes, |count, _| *count += 1.0);
                for (label, sum) in &mut sums {
                    *sum /= counts[label];
                }
                sums
            }
            AggregationMode::Binary => {
                let mut sums = tally(&votes, |score, weight| *score += weight);
                for (label, sum) in &mut sums {
                    let penalty: f64 = roster
                        .iter()
                        .filter(|classifier| !classifier.proposes(sequence_id, label))
                        .map(|classifier| classifier.weight(label))
                        .sum();
                    *sum = (*sum - penalty) / 2.0;
                }
                sums
            }
        };
        Aggregation {
            table: ScoreTable {
                scores,
                total_votes,
            },
            trace: trace(sequence_id, roster, self.mode),
        }
    }
}

/// Every vote cast for a sequence, in roster then prediction order.
#[must_use]
pub fn collect_votes<'a>(sequence_id: &str, roster: &'a ClassifierRoster) -> Vec<Vote<'a>> {
    roster
        .iter()
        .filter_map(|classifier| {
            classifier
                .labels_for(sequence_id)
                .map(|labels| (classifier, labels))
        })
        .flat_map(|(classifier, labels)| {
            labels.iter().map(move |label| Vote {
                classifier: classifier.name(),
                label,
                weight: classifier.weight(label),
            })
        })
        .collect()
}

// Folds votes per label starting from 0.0. Weights are non-negative, so 0.0
// is also the right seed for the max fold.
fn tally(votes: &[Vote<'_>], mut fold: impl FnMut(&mut f64, f64)) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();
    for vote in votes {
        let score = scores.entry(vote.label.to_owned()).or_insert(0.0);
        fold(score, vote.weight);
    }
    scores
}

fn trace(
    sequence_id: &str,
    roster: &ClassifierRoster,
    mode: AggregationMode,
) -> IndexMap<String, Vec<String>> {
    roster
        .iter()
        .filter_map(|classifier| {
            let labels = classifier.labels_for(sequence_id)?;
            let entries = labels
                .iter()
                .map(|label| {
                    if mode.is_count() {
                        label.clone()
                    } else {
                        format!("{label} ({:.3})", classifier.weight(label))
                    }
                })
                .collect();
            Some((classifier.name().to_owned(), entries))
        })
        .collect()
}
