//! # medcam_core
//!
//! Core types for medcam-rs medical image explanation.
//!
//! This crate provides:
//! - [`ClassRegistry`] mapping class indices to diagnostic category names
//! - Error types and common utilities
//! - Backend type aliases
//!
//! ## Shape Convention
//!
//! Image data follows the convention `(B, C, H, W)`:
//! - `B`: Batch size (always 1 for a single analysis)
//! - `C`: Color channels (3, RGB)
//! - `H`/`W`: Spatial dimensions at the display resolution

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod registry;

pub use error::{CoreError, Result};
pub use registry::ClassRegistry;

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;

    #[cfg(feature = "backend-wgpu")]
    pub use burn_wgpu::Wgpu;
}
