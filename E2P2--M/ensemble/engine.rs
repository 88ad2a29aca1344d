use std::{collections::BTreeSet, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::{
    classifier::ClassifierRoster,
    decision::{Outcome, RankedLabel, ScoreAggregator, Selector, Threshold, VotingScheme},
    prediction::{FinalPrediction, PredictionEntry},
};

/// Voting scheme and threshold for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunParameters {
    /// Voting scheme.
    pub scheme: VotingScheme,
    /// Inclusion threshold for secondary labels.
    pub threshold: Threshold,
}

impl RunParameters {
    /// Bundles a scheme with its threshold.
    #[must_use]
    pub const fn new(scheme: VotingScheme, threshold: Threshold) -> Self {
        Self { scheme, threshold }
    }

    /// Method description used in report headers.
    #[must_use]
    pub fn describe(&self) -> String {
        self.scheme.describe(self.threshold)
    }
}

/// Computes the final call for one sequence.
///
/// Pure: the result depends only on the arguments. Every classifier that
/// listed the sequence shows up in the trace whether or not its labels made
/// the final call.
#[must_use]
pub fn compute(
    sequence_id: &str,
    roster: &ClassifierRoster,
    scheme: VotingScheme,
    threshold: Threshold,
) -> FinalPrediction {
    let aggregation = ScoreAggregator::new(scheme.aggregation()).aggregate(sequence_id, roster);
    let outcome = Selector::new(scheme, threshold).select(&aggregation.table);
    debug!(
        sequence_id,
        candidates = aggregation.table.len(),
        votes = aggregation.table.total_votes(),
        outcome = ?outcome,
        "ensemble.sequence.scored"
    );

    let weighted = !scheme.is_count_based();
    let entry = |ranked: RankedLabel| {
        if weighted {
            PredictionEntry::scored(ranked.label, ranked.score)
        } else {
            PredictionEntry::bare(ranked.label)
        }
    };
    match outcome {
        Outcome::NoVotes | Outcome::Ambiguous(_) => {
            FinalPrediction::na(sequence_id, aggregation.trace)
        }
        Outcome::Sole(ranked) => {
            FinalPrediction::called(sequence_id, [entry(ranked)], aggregation.trace)
        }
        Outcome::Winner { top, secondary } => FinalPrediction::called(
            sequence_id,
            std::iter::once(top).chain(secondary).map(entry),
            aggregation.trace,
        ),
    }
}

/// Roster bound to run parameters.
#[derive(Debug, Clone)]
pub struct EnsembleEngine {
    roster: Arc<ClassifierRoster>,
    parameters: RunParameters,
}

impl EnsembleEngine {
    /// Creates an engine over an immutable roster.
    #[must_use]
    pub fn new(roster: impl Into<Arc<ClassifierRoster>>, parameters: RunParameters) -> Self {
        Self {
            roster: roster.into(),
            parameters,
        }
    }

    /// Roster the engine reads from.
    #[must_use]
    pub fn roster(&self) -> &ClassifierRoster {
        &self.roster
    }

    /// Parameters applied to every sequence.
    #[must_use]
    pub const fn parameters(&self) -> RunParameters {
        self.parameters
    }

    /// Final call for one sequence.
    #[must_use]
    pub fn predict(&self, sequence_id: &str) -> FinalPrediction {
        compute(
            sequence_id,
            &self.roster,
            self.parameters.scheme,
            self.parameters.threshold,
        )
    }

    /// Final calls for a set of sequences, keyed and ordered by sequence ID.
    /// Sequences no classifier listed still get an NA call.
    #[must_use]
    pub fn predict_all<I, S>(&self, sequence_ids: I) -> IndexMap<String, FinalPrediction>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ordered: BTreeSet<String> = sequence_ids.into_iter().map(Into::into).collect();
        ordered
            .into_iter()
            .map(|sequence_id| {
                let prediction = self.predict(&sequence_id);
                (sequence_id, prediction)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::Classifier,
        decision::ThresholdMode,
        prediction::NA_LABEL,
    };

    fn floor(value: f64) -> Threshold {
        Threshold::new(ThresholdMode::AbsoluteFloor, value).unwrap()
    }

    fn count_roster(votes: &[(&str, usize)]) -> ClassifierRoster {
        let mut roster = ClassifierRoster::new();
        for (label, count) in votes {
            for n in 0..*count {
                let classifier =
                    Classifier::new(format!("{label}{n}")).with_prediction("Q1", [*label]);
                roster.register(classifier).unwrap();
            }
        }
        roster
    }

    fn weighted_roster() -> ClassifierRoster {
        let blast = Classifier::new("BLAST")
            .with_prediction("Q1", ["A", "B"])
            .with_weight("A", 0.9)
            .unwrap()
            .with_weight("B", 0.5)
            .unwrap();
        let priam = Classifier::new("Priam")
            .with_prediction("Q1", ["C"])
            .with_weight("C", 0.2)
            .unwrap();
        ClassifierRoster::from_classifiers([blast, priam]).unwrap()
    }

    #[test]
    fn zero_votes_is_na_in_every_scheme() {
        let roster = weighted_roster();
        for scheme in VotingScheme::ALL {
            let prediction = compute("unlisted", &roster, scheme, Threshold::default());
            assert_eq!(prediction.labels(), vec![NA_LABEL], "{scheme:?}");
            assert!(prediction.classifiers().is_empty());
        }
    }

    #[test]
    fn single_distinct_label_wins_in_every_scheme() {
        let blast = Classifier::new("BLAST")
            .with_prediction("Q1", ["EF1"])
            .with_weight("EF1", 0.3)
            .unwrap();
        let priam = Classifier::new("Priam").with_prediction("Q1", ["EF1"]);
        let catfam = Classifier::new("CatFam")
            .with_prediction("Q2", ["EF7"])
            .with_weight("EF1", 0.9)
            .unwrap();
        let roster = ClassifierRoster::from_classifiers([blast, priam, catfam]).unwrap();
        for scheme in VotingScheme::ALL {
            let prediction = compute("Q1", &roster, scheme, floor(0.0));
            assert_eq!(prediction.labels(), vec!["EF1"], "{scheme:?}");
        }
    }

    #[test]
    fn plurality_examples() {
        let tied = compute(
            "Q1",
            &count_roster(&[("A", 2), ("B", 2), ("C", 1)]),
            VotingScheme::Plurality,
            floor(0.5),
        );
        assert!(tied.is_na());
        let clear = compute(
            "Q1",
            &count_roster(&[("A", 3), ("B", 1)]),
            VotingScheme::Plurality,
            floor(0.5),
        );
        assert_eq!(clear.entries(), &[PredictionEntry::bare("A")]);
    }

    #[test]
    fn majority_examples() {
        let split = compute(
            "Q1",
            &count_roster(&[("A", 2), ("B", 2)]),
            VotingScheme::Majority,
            floor(0.5),
        );
        assert!(split.is_na());
        let clear = compute(
            "Q1",
            &count_roster(&[("A", 3), ("B", 1)]),
            VotingScheme::Majority,
            floor(0.5),
        );
        assert_eq!(clear.labels(), vec!["A"]);
    }

    #[test]
    fn max_weight_with_absolute_floor_keeps_close_runner_up() {
        let prediction = compute("Q1", &weighted_roster(), VotingScheme::MaxWeight, floor(0.5));
        assert_eq!(
            prediction.entries(),
            &[PredictionEntry::scored("A", 0.9), PredictionEntry::scored("B", 0.5)]
        );
        assert!(prediction.is_multi_function());
        assert_eq!(prediction.classifiers()["BLAST"], vec!["A (0.900)", "B (0.500)"]);
        assert_eq!(prediction.classifiers()["Priam"], vec!["C (0.200)"]);
    }

    #[test]
    fn global_average_excludes_distant_label() {
        let one = Classifier::new("one")
            .with_prediction("Q1", ["A"])
            .with_weight("A", 0.8)
            .unwrap();
        let two = Classifier::new("two")
            .with_prediction("Q1", ["A", "B"])
            .with_weight("A", 0.6)
            .unwrap()
            .with_weight("B", 0.4)
            .unwrap();
        let roster = ClassifierRoster::from_classifiers([one, two]).unwrap();
        let prediction = compute("Q1", &roster, VotingScheme::AverageWeight, floor(0.2));
        assert_eq!(prediction.labels(), vec!["A"]);
        let score = prediction.entries()[0].score.unwrap();
        assert!((score - 1.4 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn binary_percent_threshold_drops_net_negative_labels() {
        let one = Classifier::new("one")
            .with_prediction("Q1", ["A", "B"])
            .with_weight("A", 1.8)
            .unwrap();
        let two = Classifier::new("two").with_weight("B", 0.4).unwrap();
        let roster = ClassifierRoster::from_classifiers([one, two]).unwrap();
        let threshold = Threshold::new(ThresholdMode::PercentOfTop, 200.0).unwrap();
        // A scores (1.8 - 0) / 2, B scores (0 - 0.4) / 2.
        let prediction = compute("Q1", &roster, VotingScheme::BinaryAverageWeight, threshold);
        assert_eq!(prediction.labels(), vec!["A"]);
        assert!((prediction.entries()[0].score.unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn count_schemes_ignore_threshold_and_emit_bare_traces() {
        let prediction = compute("Q1", &weighted_roster(), VotingScheme::Plurality, floor(100.0));
        // A, B and C each have one vote.
        assert!(prediction.is_na());
        assert_eq!(prediction.classifiers()["BLAST"], vec!["A", "B"]);
    }

    #[test]
    fn engine_predicts_sorted_unique_universe() {
        let engine = EnsembleEngine::new(
            weighted_roster(),
            RunParameters::new(VotingScheme::MaxWeight, floor(0.1)),
        );
        let results = engine.predict_all(["Q9", "Q1", "Q9"]);
        let ids: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["Q1", "Q9"]);
        assert_eq!(results["Q1"].labels(), vec!["A"]);
        assert!(results["Q9"].is_na());
        assert_eq!(engine.parameters().scheme, VotingScheme::MaxWeight);
        assert_eq!(engine.roster().len(), 2);
    }

    #[test]
    fn describe_matches_scheme_and_threshold() {
        assert_eq!(
            RunParameters::default().describe(),
            "Maximum weight with absolute threshold (0.5)"
        );
    }
}
