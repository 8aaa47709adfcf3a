//! Error types for medcam_explain.

use thiserror::Error;

/// Result type alias using [`ExplainError`].
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Errors that can occur during capture or CAM synthesis.
#[derive(Error, Debug)]
pub enum ExplainError {
    /// Attach was called on a tap that is already attached.
    #[error("Capture is already attached; detach it before re-attaching")]
    AlreadyAttached,

    /// Captured tensors were requested from a detached tap.
    #[error("Capture is detached; no activation/gradient pair is available")]
    Detached,

    /// No forward activation was captured before synthesis.
    #[error("No activation captured; run a forward pass before synthesizing a CAM")]
    MissingActivation,

    /// No backward gradient was captured before synthesis.
    #[error("No gradient captured; run a backward pass before synthesizing a CAM")]
    MissingGradient,

    /// Activation and gradient tensors disagree in shape.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Tensor data could not be read back from the backend.
    #[error("Tensor data error: {0}")]
    Data(String),
}
