//! Error types for the boleto analysis core.
//!
//! Extraction misses and checksum mismatches are data, not errors. The only
//! hard failure the core raises is a classifier that breaks its contract.

use thiserror::Error;

/// The external classifier returned something no verdict can be built from.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractViolation {
    /// Feature vector of the wrong length
    #[error("feature vector must have {expected} values (got {actual})")]
    FeatureLength { expected: usize, actual: usize },

    /// Predicted class outside {0, 1}
    #[error("predicted class {0} is not 0 or 1")]
    UnknownClass(i64),

    /// Probability that is NaN, infinite or outside [0, 1]
    #[error("probability for class {class} is not a valid probability: {value}")]
    InvalidProbability { class: usize, value: f64 },

    /// Scorer failed to produce an output
    #[error("classifier '{model}' failed: {message}")]
    Scorer { model: String, message: String },
}

/// Failure of a pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("classifier contract violation: {0}")]
    Classifier(#[from] ContractViolation),
}

/// Result alias for the pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;
