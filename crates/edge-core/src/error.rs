//! Unified error type for the edge offloading toolkit
//!
//! One [`EdgeError`] enum every crate in the workspace can produce and
//! convert into, rather than each crate rolling its own ad-hoc error type.

use thiserror::Error;

/// Unified error type for all edge-offloading operations.
#[derive(Error, Debug)]
pub enum EdgeError {
    /// `getqpm` derived params violate `0 < q < p <= m`.
    #[error("invalid bucket parameters: {0}")]
    InvalidBucket(String),

    /// MetricFit was given fewer than 2 samples, or a zero-variance entropy
    /// span. Not fatal: callers get a constant map back alongside this as a
    /// warning, not an `Err`.
    #[error("degenerate metric-fit input: {0}")]
    DegenerateInput(String),

    /// A policy or dataset array had the wrong length.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Value iteration hit `maxiter` before the policy stabilized. Not
    /// fatal: the last iterate is still returned to the caller.
    #[error("MDP did not converge within {max_iter} iterations (last policy delta {last_delta:e})")]
    NonConvergence { max_iter: usize, last_delta: f64 },

    /// I/O errors reading datasets or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors for persisted artifacts.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Generic errors (for wrapping external errors at API boundaries).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for results using [`EdgeError`].
pub type EdgeResult<T> = Result<T, EdgeError>;

impl From<anyhow::Error> for EdgeError {
    fn from(err: anyhow::Error) -> Self {
        EdgeError::Other(err.to_string())
    }
}

impl From<String> for EdgeError {
    fn from(s: String) -> Self {
        EdgeError::Other(s)
    }
}

impl From<&str> for EdgeError {
    fn from(s: &str) -> Self {
        EdgeError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for EdgeError {
    fn from(err: serde_json::Error) -> Self {
        EdgeError::Serialize(err.to_string())
    }
}

impl From<bincode::Error> for EdgeError {
    fn from(err: bincode::Error) -> Self {
        EdgeError::Serialize(err.to_string())
    }
}
