//! Run configuration loaded from TOML.
//!
//! ```toml
//! scheme = "max_weight"
//! workers = 4
//!
//! [threshold]
//! mode = "absolute_floor"
//! value = 0.5
//!
//! [telemetry]
//! module = "ensemble"
//! log_path = "logs/ensemble.log"
//! ```
//!
//! Every key is optional; the defaults reproduce the standard pipeline run
//! (maximum weight, absolute threshold 0.5).

use std::{num::NonZeroUsize, path::PathBuf, thread};

use serde::Deserialize;

use crate::{
    decision::{Threshold, ThresholdMode, VotingScheme},
    engine::RunParameters,
    error::{EnsembleError, EnsembleResult},
};

/// Top-level ensemble configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnsembleConfig {
    /// Voting scheme.
    #[serde(default)]
    pub scheme: VotingScheme,
    /// Threshold settings.
    #[serde(default)]
    pub threshold: ThresholdConfig,
    /// Concurrent chunks used by the batch runtime.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Threshold section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Cutoff mode.
    #[serde(default)]
    pub mode: ThresholdMode,
    /// Threshold value.
    #[serde(default = "default_threshold_value")]
    pub value: f64,
}

/// Telemetry section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Module name stamped on log records and events.
    #[serde(default = "default_module")]
    pub module: String,
    /// JSON-lines log file; logging is disabled when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl EnsembleConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> EnsembleResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the threshold and worker count.
    pub fn validate(&self) -> EnsembleResult<()> {
        if self.workers == 0 {
            return Err(EnsembleError::InvalidWorkerCount);
        }
        self.threshold()?;
        Ok(())
    }

    /// Validated threshold.
    pub fn threshold(&self) -> EnsembleResult<Threshold> {
        Threshold::new(self.threshold.mode, self.threshold.value)
    }

    /// Engine parameters described by this configuration.
    pub fn run_parameters(&self) -> EnsembleResult<RunParameters> {
        Ok(RunParameters::new(self.scheme, self.threshold()?))
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            scheme: VotingScheme::default(),
            threshold: ThresholdConfig::default(),
            workers: default_workers(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::default(),
            value: default_threshold_value(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            log_path: None,
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

const fn default_threshold_value() -> f64 {
    0.5
}

fn default_module() -> String {
    "ensemble".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_pipeline_defaults() {
        let config = EnsembleConfig::from_toml_str("").unwrap();
        assert_eq!(config.scheme, VotingScheme::MaxWeight);
        assert_eq!(config.threshold.mode, ThresholdMode::AbsoluteFloor);
        assert_eq!(config.threshold.value, 0.5);
        assert!(config.workers >= 1);
        assert_eq!(config.telemetry.module, "ensemble");
        assert!(config.telemetry.log_path.is_none());
        assert_eq!(config.run_parameters().unwrap(), RunParameters::default());
    }

    #[test]
    fn parses_full_document() {
        let raw = r#"
            scheme = "binary_average_weight"
            workers = 3

            [threshold]
            mode = "percent_of_top"
            value = 20.0

            [telemetry]
            module = "e2p2"
            log_path = "logs/ensemble.log"
        "#;
        let config = EnsembleConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.scheme, VotingScheme::BinaryAverageWeight);
        assert_eq!(config.workers, 3);
        let parameters = config.run_parameters().unwrap();
        assert_eq!(parameters.threshold.mode(), ThresholdMode::PercentOfTop);
        assert_eq!(parameters.threshold.value(), 20.0);
        assert_eq!(config.telemetry.log_path, Some(PathBuf::from("logs/ensemble.log")));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EnsembleConfig::from_toml_str("workers = 0"),
            Err(EnsembleError::InvalidWorkerCount)
        ));
        assert!(matches!(
            EnsembleConfig::from_toml_str("[threshold]\nvalue = -0.1"),
            Err(EnsembleError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            EnsembleConfig::from_toml_str("scheme = \"loudest\""),
            Err(EnsembleError::Config(_))
        ));
        assert!(matches!(
            EnsembleConfig::from_toml_str("tie_break = \"random\""),
            Err(EnsembleError::Config(_))
        ));
    }
}
