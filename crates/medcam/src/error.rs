//! Top-level error type aggregating the per-stage errors.

use thiserror::Error;

/// Result type alias using [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Any failure an analysis can surface, by pipeline stage.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image decoding, preprocessing, or artifact rendering failed.
    #[error(transparent)]
    Vision(#[from] medcam_vision::VisionError),

    /// Checkpoint loading or model execution failed.
    #[error(transparent)]
    Model(#[from] medcam_models::ModelError),

    /// Capture or CAM synthesis failed.
    #[error(transparent)]
    Explain(#[from] medcam_explain::ExplainError),

    /// Class registry lookup failed.
    #[error(transparent)]
    Core(#[from] medcam_core::CoreError),
}
