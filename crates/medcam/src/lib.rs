//! # medcam
//!
//! Medical scan classification with Grad-CAM visual explanations.
//!
//! The facade crate ties the workspace together:
//! - `medcam_core`: class registry and core types
//! - `medcam_models`: the residual classifier and checkpoint handling
//! - `medcam_explain`: activation/gradient capture and CAM synthesis
//! - `medcam_vision`: image preprocessing and artifact rendering
//!
//! The main entry point is [`Explainer`]: load a checkpoint once, then
//! call [`Explainer::analyze`] per scan to get a prediction plus a
//! heatmap and overlay explaining it.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod analyze;
mod error;
mod report;

pub use analyze::{Explainer, DEFAULT_OVERLAY_ALPHA};
pub use error::{AnalysisError, Result};
pub use report::AnalysisReport;

pub use medcam_core as core;
pub use medcam_explain as explain;
pub use medcam_models as models;
pub use medcam_vision as vision;

/// Commonly used items.
pub mod prelude {
    pub use crate::analyze::{Explainer, DEFAULT_OVERLAY_ALPHA};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::report::AnalysisReport;

    pub use medcam_core::ClassRegistry;
    pub use medcam_explain::{synthesize, Cam, LayerTap, TapGuard};
    pub use medcam_models::{
        load_checkpoint, save_checkpoint, Classifier, ScanResNet, ScanResNetConfig,
    };
    pub use medcam_vision::PreprocessConfig;
}
