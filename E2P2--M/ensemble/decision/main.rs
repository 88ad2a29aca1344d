//! Per-sequence decision pipeline: score votes, rank candidates, apply the threshold.

/// Vote aggregation into score tables.
pub mod aggregator;
/// Voting scheme enumeration.
pub mod scheme;
/// Ranking and winner selection.
pub mod selector;
/// Secondary-label inclusion cutoffs.
pub mod threshold;

pub use aggregator::{
    collect_votes, Aggregation, AggregationMode, ScoreAggregator, ScoreTable, Vote,
};
pub use scheme::VotingScheme;
pub use selector::{rank, Ambiguity, Outcome, RankedLabel, Selector};
pub use threshold::{Threshold, ThresholdMode};
