use std::cmp::Ordering;

use serde::Serialize;

use super::{aggregator::ScoreTable, scheme::VotingScheme, threshold::Threshold};

/// A label with its aggregated score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedLabel {
    /// Candidate label.
    pub label: String,
    /// Aggregated score.
    pub score: f64,
}

impl RankedLabel {
    /// Creates a ranked label.
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Why no single label could be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ambiguity {
    /// Several labels share the highest count.
    TiedMaximum,
    /// The highest count does not exceed half of the votes cast.
    NoMajority,
}

/// Result of selecting among scored candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing was proposed for the sequence.
    NoVotes,
    /// Count-based call without a clear winner.
    Ambiguous(Ambiguity),
    /// Only one distinct label was proposed; it wins outright.
    Sole(RankedLabel),
    /// Ranked winner plus secondary labels admitted by the threshold.
    Winner {
        /// Highest ranked label.
        top: RankedLabel,
        /// Runners-up at or above the cutoff, in ranking order.
        secondary: Vec<RankedLabel>,
    },
}

impl Outcome {
    /// True when the outcome resolves to the NA sentinel.
    #[must_use]
    pub const fn is_na(&self) -> bool {
        matches!(self, Self::NoVotes | Self::Ambiguous(_))
    }
}

/// Orders labels by score descending, then label ascending.
#[must_use]
pub fn rank(table: &ScoreTable) -> Vec<RankedLabel> {
    let mut ranked: Vec<RankedLabel> = table
        .iter()
        .map(|(label, score)| RankedLabel::new(label, score))
        .collect();
    ranked.sort_by(compare);
    ranked
}

fn compare(left: &RankedLabel, right: &RankedLabel) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| left.label.cmp(&right.label))
}

/// Picks the final label(s) from a score table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    scheme: VotingScheme,
    threshold: Threshold,
}

impl Selector {
    /// Creates a selector for a scheme; the threshold only matters for weight-based schemes.
    #[must_use]
    pub const fn new(scheme: VotingScheme, threshold: Threshold) -> Self {
        Self { scheme, threshold }
    }

    /// Selects the outcome for one sequence.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn select(&self, table: &ScoreTable) -> Outcome {
        let mut ranked = rank(table);
        if ranked.len() <= 1 {
            return ranked.pop().map_or(Outcome::NoVotes, Outcome::Sole);
        }
        let runners_up = ranked.split_off(1);
        let Some(top) = ranked.pop() else {
            return Outcome::NoVotes;
        };

        if self.scheme.is_count_based() {
            if self.scheme == VotingScheme::Majority {
                let majority_bar = (table.total_votes() / 2) as f64;
                if top.score <= majority_bar {
                    return Outcome::Ambiguous(Ambiguity::NoMajority);
                }
            }
            if runners_up[0].score == top.score {
                return Outcome::Ambiguous(Ambiguity::TiedMaximum);
            }
            return Outcome::Winner {
                top,
                secondary: Vec::new(),
            };
        }

        let secondary = self.threshold.secondary(top.score, &runners_up);
        Outcome::Winner { top, secondary }
    }
}
