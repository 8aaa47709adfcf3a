//! # medcam_explain
//!
//! Grad-CAM explanation engine: activation/gradient capture and
//! class-activation map synthesis.
//!
//! This crate provides:
//! - [`LayerTap`] and [`TapGuard`]: per-analysis instrumentation of the
//!   designated convolutional layer, recording its forward output and the
//!   gradient flowing back into it
//! - [`synthesize`]: combining a captured activation/gradient pair into a
//!   normalized spatial importance map sized to the display resolution
//!
//! The capture state is request-scoped: one [`LayerTap`] per analysis,
//! never shared between concurrent analyses.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod cam;
mod error;
mod tap;

pub use cam::{synthesize, Cam};
pub use error::{ExplainError, Result};
pub use tap::{LayerTap, TapGuard};
