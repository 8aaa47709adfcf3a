//! # medcam_models
//!
//! Convolutional classifier architecture and checkpoint handling for
//! medcam-rs.
//!
//! This crate provides:
//! - [`ScanResNet`], a 2-D residual backbone with a linear classification
//!   head, exposing a split forward (`forward_features` / `forward_head`)
//!   so the explanation engine can instrument the last convolutional stage
//! - Checkpoint save/load built on Burn's record system plus a JSON
//!   metadata sidecar carrying the ordered class list
//! - [`Classifier`], the inference wrapper holding the frozen model in
//!   evaluation mode for the process lifetime

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod checkpoint;
mod classifier;
mod error;
mod resnet;

pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointMeta, LoadedCheckpoint};
pub use classifier::Classifier;
pub use error::{ModelError, Result};
pub use resnet::{ScanResNet, ScanResNetConfig};
