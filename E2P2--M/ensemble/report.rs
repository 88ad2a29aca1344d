//! Text renderings of final calls.
//!
//! Short form: `sequenceID<TAB>label1|label2`, labels only.
//! Long form: `>sequenceID<TAB>label (score)|...` followed by one line per
//! classifier that produced output, and a blank separator line.
//!
//! Nothing here touches the filesystem; callers decide where the text goes.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::{engine::RunParameters, prediction::FinalPrediction};

/// Comment lines heading both report forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    /// When the run happened.
    pub run_at: DateTime<Utc>,
    /// Method description.
    pub method: String,
}

impl ReportHeader {
    /// Header for a run starting now.
    #[must_use]
    pub fn new(parameters: &RunParameters) -> Self {
        Self::at(Utc::now(), parameters)
    }

    /// Header for a run at a given instant.
    #[must_use]
    pub fn at(run_at: DateTime<Utc>, parameters: &RunParameters) -> Self {
        Self {
            run_at,
            method: parameters.describe(),
        }
    }

    /// Renders the two `#` lines, newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "# Run date, time:  {}\n# Ensemble method used:  {}\n",
            self.run_at.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.method
        )
    }
}

/// `sequenceID<TAB>label1|label2` without trailing newline.
#[must_use]
pub fn short_line(prediction: &FinalPrediction) -> String {
    format!("{}\t{}", prediction.sequence_id(), prediction.labels().join("|"))
}

/// Long-form block for one sequence, including the trailing blank line.
#[must_use]
pub fn long_block(prediction: &FinalPrediction) -> String {
    let calls: Vec<String> = prediction.entries().iter().map(ToString::to_string).collect();
    let mut block = format!(">{}\t{}\n", prediction.sequence_id(), calls.join("|"));
    for (classifier, entries) in prediction.classifiers() {
        if entries.is_empty() {
            continue;
        }
        // Writing into a String cannot fail.
        let _ = writeln!(block, "{classifier}\t{}", entries.join("|"));
    }
    block.push('\n');
    block
}

/// Header plus one short line per prediction.
#[must_use]
pub fn render_short<'a>(
    header: &ReportHeader,
    predictions: impl IntoIterator<Item = &'a FinalPrediction>,
) -> String {
    let mut out = header.render();
    for prediction in predictions {
        out.push_str(&short_line(prediction));
        out.push('\n');
    }
    out
}

/// Header plus one long block per prediction.
#[must_use]
pub fn render_long<'a>(
    header: &ReportHeader,
    predictions: impl IntoIterator<Item = &'a FinalPrediction>,
) -> String {
    let mut out = header.render();
    for prediction in predictions {
        out.push_str(&long_block(prediction));
    }
    out
}
