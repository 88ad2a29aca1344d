#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! E2P2 ensemble: fuses per-classifier enzyme-function predictions into one
//! final call per protein sequence.

/// Boundary validation errors.
#[path = "../error.rs"]
pub mod error;

/// Classifier prediction and weight tables.
#[path = "../classifier.rs"]
pub mod classifier;

/// Scoring, ranking and threshold selection.
#[path = "../decision/main.rs"]
pub mod decision;

/// Final per-sequence calls.
#[path = "../prediction.rs"]
pub mod prediction;

/// Per-sequence computation and the engine facade.
#[path = "../engine.rs"]
pub mod engine;

/// TOML run configuration.
#[path = "../config.rs"]
pub mod config;

/// EF class to EC / reaction translation.
#[path = "../label_map.rs"]
pub mod label_map;

/// Short and long text reports.
#[path = "../report.rs"]
pub mod report;

/// Telemetry builder/hook for ensemble components.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Batch runtime entry point.
#[path = "../main.rs"]
pub mod runtime;

pub use classifier::{Classifier, ClassifierRoster, WeightTable};
pub use config::EnsembleConfig;
pub use decision::{Threshold, ThresholdMode, VotingScheme};
pub use engine::{compute, EnsembleEngine, RunParameters};
pub use error::{EnsembleError, EnsembleResult};
pub use label_map::{Annotation, LabelMap};
pub use prediction::{FinalPrediction, PredictionEntry, NA_LABEL};
pub use report::ReportHeader;
pub use runtime::{BatchOutcome, BatchSummary, EnsembleRuntime};
pub use telemetry::{EnsembleTelemetry, EnsembleTelemetryBuilder};
