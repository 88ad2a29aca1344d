use serde::{Deserialize, Serialize};

use super::{aggregator::AggregationMode, threshold::Threshold};

/// Run-selectable voting policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingScheme {
    /// Most votes wins; ties at the top resolve to NA.
    Plurality,
    /// Most votes wins only with more than half of all votes cast.
    Majority,
    /// Highest single-classifier weight wins.
    #[default]
    MaxWeight,
    /// Highest weight sum over all votes cast wins.
    AverageWeight,
    /// Highest weight sum over the label's own votes wins.
    FixedAverageWeight,
    /// Highest support minus dissent wins.
    BinaryAverageWeight,
}

impl VotingScheme {
    /// Every scheme, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Plurality,
        Self::Majority,
        Self::MaxWeight,
        Self::AverageWeight,
        Self::FixedAverageWeight,
        Self::BinaryAverageWeight,
    ];

    /// Aggregation feeding this scheme.
    #[must_use]
    pub const fn aggregation(self) -> AggregationMode {
        match self {
            Self::Plurality | Self::Majority => AggregationMode::Count,
            Self::MaxWeight => AggregationMode::MaxWeight,
            Self::AverageWeight => AggregationMode::AverageGlobal,
            Self::FixedAverageWeight => AggregationMode::AveragePerLabel,
            Self::BinaryAverageWeight => AggregationMode::Binary,
        }
    }

    /// Count-based schemes emit bare labels and never use the threshold.
    #[must_use]
    pub const fn is_count_based(self) -> bool {
        self.aggregation().is_count()
    }

    /// Human-readable method name, e.g. `Maximum weight with absolute threshold (0.5)`.
    #[must_use]
    pub fn describe(self, threshold: Threshold) -> String {
        let base = match self {
            Self::Plurality => return "Plurality voting".to_owned(),
            Self::Majority => return "Majority voting".to_owned(),
            Self::MaxWeight => "Maximum weight",
            Self::AverageWeight => "Average weight",
            Self::FixedAverageWeight => "Fixed average weight",
            Self::BinaryAverageWeight => "Binary average weight",
        };
        format!(
            "{base} with {} threshold ({})",
            threshold.mode().describe(),
            threshold.value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::threshold::ThresholdMode;

    #[test]
    fn schemes_map_onto_aggregation_modes() {
        let counted: Vec<VotingScheme> = VotingScheme::ALL
            .into_iter()
            .filter(|scheme| scheme.is_count_based())
            .collect();
        assert_eq!(counted, vec![VotingScheme::Plurality, VotingScheme::Majority]);
        assert_eq!(
            VotingScheme::FixedAverageWeight.aggregation(),
            AggregationMode::AveragePerLabel
        );
    }

    #[test]
    fn descriptions_name_the_threshold() {
        assert_eq!(
            VotingScheme::MaxWeight.describe(Threshold::default()),
            "Maximum weight with absolute threshold (0.5)"
        );
        let percent = Threshold::new(ThresholdMode::PercentOfTop, 10.0).unwrap();
        assert_eq!(
            VotingScheme::BinaryAverageWeight.describe(percent),
            "Binary average weight with percent threshold (10)"
        );
        assert_eq!(VotingScheme::Majority.describe(percent), "Majority voting");
    }

    #[test]
    fn serde_names_are_snake_case() {
        let scheme: VotingScheme = serde_json::from_str("\"fixed_average_weight\"").unwrap();
        assert_eq!(scheme, VotingScheme::FixedAverageWeight);
        assert_eq!(
            serde_json::to_string(&VotingScheme::BinaryAverageWeight).unwrap(),
            "\"binary_average_weight\""
        );
    }
}
