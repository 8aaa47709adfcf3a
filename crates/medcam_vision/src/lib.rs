//! # medcam_vision
//!
//! Image handling for medcam-rs: decoding and normalizing scan images
//! into model input tensors, and rendering class-activation maps as
//! heatmap and overlay artifacts.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod preprocess;
mod render;

pub use error::{Result, VisionError};
pub use preprocess::{load_rgb, resize_display, to_tensor, PreprocessConfig};
pub use render::{render_heatmap, render_overlay, write_artifacts, ArtifactPaths};
