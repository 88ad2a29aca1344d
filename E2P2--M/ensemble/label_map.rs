use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::prediction::FinalPrediction;

/// Output identifier an EF class translates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "UPPERCASE")]
pub enum Annotation {
    /// Enzyme Commission number.
    Ec(String),
    /// MetaCyc reaction identifier.
    Metacyc(String),
}

impl Annotation {
    /// Identifier text.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Ec(id) | Self::Metacyc(id) => id,
        }
    }
}

/// Immutable EF class -> EC number / reaction ID mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<String, String>,
}

impl LabelMap {
    /// Number of mapped labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translates one label. Identifiers containing `RXN` are reactions.
    #[must_use]
    pub fn translate(&self, label: &str) -> Option<Annotation> {
        let id = self.entries.get(label)?;
        Some(if id.contains("RXN") {
            Annotation::Metacyc(id.clone())
        } else {
            Annotation::Ec(id.clone())
        })
    }

    /// Translates every called label of a prediction, in call order. NA
    /// calls yield nothing; unmapped labels are skipped with a warning.
    #[must_use]
    pub fn annotate(&self, prediction: &FinalPrediction) -> Vec<Annotation> {
        if prediction.is_na() {
            return Vec::new();
        }
        prediction
            .labels()
            .into_iter()
            .filter_map(|label| {
                let annotation = self.translate(label);
                if annotation.is_none() {
                    warn!(
                        sequence_id = prediction.sequence_id(),
                        label, "label has no output mapping"
                    );
                }
                annotation
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for LabelMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(label, id)| (label.into(), id.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::PredictionEntry;
    use indexmap::IndexMap;

    fn map() -> LabelMap {
        [("EF0001", "1.1.1.1"), ("EF0002", "RXN-1234"), ("EF0003", "ALCOHOL-DEHYDROG-RXN")]
            .into_iter()
            .collect()
    }

    #[test]
    fn reaction_ids_are_metacyc() {
        let labels = map();
        assert_eq!(labels.translate("EF0001"), Some(Annotation::Ec("1.1.1.1".into())));
        assert_eq!(
            labels.translate("EF0003"),
            Some(Annotation::Metacyc("ALCOHOL-DEHYDROG-RXN".into()))
        );
        assert_eq!(labels.translate("EF9999"), None);
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn annotate_skips_unmapped_and_na() {
        let prediction = FinalPrediction::called(
            "Q1",
            [
                PredictionEntry::scored("EF0002", 0.9),
                PredictionEntry::scored("EF4242", 0.8),
                PredictionEntry::scored("EF0001", 0.7),
            ],
            IndexMap::new(),
        );
        let ids: Vec<String> = map()
            .annotate(&prediction)
            .iter()
            .map(|a| a.id().to_owned())
            .collect();
        assert_eq!(ids, vec!["RXN-1234", "1.1.1.1"]);
        assert!(map().annotate(&FinalPrediction::na("Q2", IndexMap::new())).is_empty());
    }

    #[test]
    fn annotations_serialize_with_kind() {
        let json = serde_json::to_value(Annotation::Ec("2.7.1.1".into())).unwrap();
        assert_eq!(json["kind"], "EC");
        assert_eq!(json["id"], "2.7.1.1");
    }
}
