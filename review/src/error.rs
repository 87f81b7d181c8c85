use thiserror::Error;

/// Failures reported by an evaluation provider for a single position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Evaluator is not ready")]
    NotReady,

    #[error("Evaluation was cancelled")]
    Cancelled,

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Review failed: {0}")]
    ReviewFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
