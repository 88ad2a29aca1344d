use serde::{Deserialize, Serialize};

use super::selector::RankedLabel;
use crate::error::{EnsembleError, EnsembleResult};

/// How the run threshold turns the top score into an inclusion cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// `top - threshold / 100`.
    AbsoluteSubtract,
    /// `max(0, top * (1 - threshold / 100))`.
    PercentOfTop,
    /// `max(0, top - threshold)`.
    #[default]
    AbsoluteFloor,
}

impl ThresholdMode {
    /// Cutoff a secondary label must reach to be kept.
    #[must_use]
    pub fn cutoff(self, top: f64, threshold: f64) -> f64 {
        match self {
            Self::AbsoluteSubtract => top - threshold / 100.0,
            Self::PercentOfTop => (top * (1.0 - threshold / 100.0)).max(0.0),
            Self::AbsoluteFloor => (top - threshold).max(0.0),
        }
    }

    /// Short name used in method descriptions.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::AbsoluteSubtract => "subtractive",
            Self::PercentOfTop => "percent",
            Self::AbsoluteFloor => "absolute",
        }
    }
}

/// Validated run threshold controlling multi-function output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    mode: ThresholdMode,
    value: f64,
}

impl Threshold {
    /// Creates a threshold; the value must be finite and non-negative.
    pub fn new(mode: ThresholdMode, value: f64) -> EnsembleResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(EnsembleError::InvalidThreshold { value });
        }
        Ok(Self { mode, value })
    }

    /// Cutoff mode.
    #[must_use]
    pub const fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Raw threshold value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Cutoff for the given top score.
    #[must_use]
    pub fn cutoff(&self, top: f64) -> f64 {
        self.mode.cutoff(top, self.value)
    }

    /// Secondary labels kept next to the winner: every runner-up scoring at
    /// or above the cutoff, in ranking order.
    #[must_use]
    pub fn secondary(&self, top: f64, runners_up: &[RankedLabel]) -> Vec<RankedLabel> {
        let cutoff = self.cutoff(top);
        runners_up
            .iter()
            .filter(|candidate| candidate.score >= cutoff)
            .cloned()
            .collect()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::AbsoluteFloor,
            value: 0.5,
        }
    }
}
