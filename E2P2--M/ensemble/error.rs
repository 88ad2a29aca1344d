use thiserror::Error;

/// Errors raised while validating ensemble inputs at the crate boundary.
///
/// The decision engine itself is infallible: missing weights default to
/// 0.000 and sequences without a clear winner resolve to `NA`.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// Threshold value is negative, NaN or infinite.
    #[error("invalid threshold {value}: expected a finite, non-negative number")]
    InvalidThreshold {
        /// Offending value.
        value: f64,
    },
    /// A weight could not be accepted for a classifier label.
    #[error("invalid weight {raw:?} for label {label} in classifier {classifier}")]
    InvalidWeight {
        /// Classifier owning the weight table.
        classifier: String,
        /// Label the weight belongs to.
        label: String,
        /// Raw value as supplied.
        raw: String,
    },
    /// A classifier proposed the NA sentinel as a label.
    #[error("classifier {classifier} proposes reserved label NA for sequence {sequence_id}")]
    ReservedLabel {
        /// Classifier that proposed it.
        classifier: String,
        /// Sequence it was proposed for.
        sequence_id: String,
    },
    /// Two classifiers share a name.
    #[error("classifier {0} registered twice")]
    DuplicateClassifier(String),
    /// Classifier name is blank.
    #[error("classifier name must not be empty")]
    EmptyClassifierName,
    /// Worker count of zero.
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
    /// Roster JSON is malformed or misses a required table.
    #[error("malformed classifier roster: {0}")]
    Roster(#[from] serde_json::Error),
    /// Configuration TOML is malformed.
    #[error("malformed ensemble configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience alias for boundary operations.
pub type EnsembleResult<T> = Result<T, EnsembleError>;
