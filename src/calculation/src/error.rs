//! Error taxonomy shared by both engines.
//!
//! Only structural problems are errors. A run that starts and then produces
//! `Inf`/`NaN` states is a valid (diverged) result, see
//! [`SimulationResult::diverged`](crate::dynamics::SimulationResult::diverged).

use thiserror::Error;

/// Failure to start a synthesis or simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Bad spectrum parameters, non-column frequency vector, out-of-range sea state.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Truncated mesh data or a degenerate face.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),

    /// Wave grid dimensions inconsistent with the requested sampling.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn mesh(msg: impl Into<String>) -> Self {
        Self::MalformedMesh(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}
