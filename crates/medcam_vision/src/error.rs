//! Error types for medcam_vision.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`VisionError`].
pub type Result<T> = std::result::Result<T, VisionError>;

/// Errors that can occur while reading, preparing, or rendering images.
#[derive(Error, Debug)]
pub enum VisionError {
    /// The input image path does not exist.
    #[error("Image not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be decoded as an image.
    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// An artifact could not be written.
    #[error("Failed to save image {}: {source}", .path.display())]
    Save {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },

    /// An overlay was requested for mismatched image and map sizes.
    #[error("Size mismatch: image is {image_w}x{image_h}, map is {map_w}x{map_h}")]
    SizeMismatch {
        /// Base image width.
        image_w: u32,
        /// Base image height.
        image_h: u32,
        /// Importance map width.
        map_w: u32,
        /// Importance map height.
        map_h: u32,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
