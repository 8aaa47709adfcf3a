//! Error types for medcam_models.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur when loading or saving model checkpoints.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The checkpoint path does not exist.
    #[error("Checkpoint not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read or deserialize checkpoint contents.
    #[error("Failed to load checkpoint: {0}")]
    Load(String),

    /// Failed to write checkpoint contents.
    #[error("Failed to save checkpoint: {0}")]
    Save(String),

    /// The metadata class list disagrees with the model configuration.
    #[error(
        "Class count mismatch: metadata lists {meta} classes but model config declares {config}"
    )]
    ClassCountMismatch {
        /// Classes listed in the checkpoint metadata.
        meta: usize,
        /// Classes declared by the model configuration.
        config: usize,
    },

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] medcam_core::CoreError),
}
