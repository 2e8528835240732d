use thiserror::Error;

/// Failures reported by the estimator. None of these are fatal to the process;
/// the caller decides whether to abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BayesError {
    #[error("estimator used before initialize")]
    NotInitialized,

    #[error("estimator is already initialized")]
    AlreadyInitialized,

    #[error("feature vector has {got} values, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("feature {index} is not a finite number: {value}")]
    NonFiniteFeature { index: usize, value: f64 },

    #[error("var_smoothing must be a positive finite number, got {0}")]
    InvalidVarSmoothing(f64),

    #[error("label {0:?} is not in the label set")]
    UnknownLabel(String),

    #[error("initial batch contains no examples")]
    EmptyBatch,

    #[error("invalid label set: {0}")]
    InvalidLabelSet(String),
}

pub type Result<T> = std::result::Result<T, BayesError>;
