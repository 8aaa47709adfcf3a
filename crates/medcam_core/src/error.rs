//! Error types for medcam_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in medcam_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The class list was empty.
    #[error("Class registry requires at least one class")]
    EmptyRegistry,

    /// A class name appeared more than once.
    #[error("Duplicate class name: '{0}'")]
    DuplicateClass(String),

    /// Index out of bounds.
    #[error("Class index {index} out of bounds for {length} classes")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of registered classes.
        length: usize,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
