//! Per-analysis capture of a layer's forward output and backward gradient.

use burn::prelude::*;

use crate::error::{ExplainError, Result};

/// Observation point on the designated convolutional layer.
///
/// Records the layer's output activation on the forward pass and the
/// gradient of the target score with respect to that output on the
/// backward pass. State is owned by one analysis; create a fresh tap per
/// request and never share one between concurrent analyses.
///
/// A new forward capture clears any previously captured gradient, so the
/// stored pair always comes from one forward/backward cycle.
#[derive(Debug)]
pub struct LayerTap<B: Backend> {
    attached: bool,
    activation: Option<Tensor<B, 4>>,
    gradient: Option<Tensor<B, 4>>,
}

impl<B: Backend> LayerTap<B> {
    /// Create a detached tap holding no captures.
    pub fn new() -> Self {
        Self {
            attached: false,
            activation: None,
            gradient: None,
        }
    }

    /// Install the observation point.
    ///
    /// Fails with [`ExplainError::AlreadyAttached`] when called twice
    /// without an intervening [`LayerTap::detach`] — double capture is
    /// never silent.
    pub fn attach(&mut self) -> Result<()> {
        if self.attached {
            return Err(ExplainError::AlreadyAttached);
        }
        self.attached = true;
        Ok(())
    }

    /// Remove the observation point and discard any captured tensors.
    pub fn detach(&mut self) {
        self.attached = false;
        self.activation = None;
        self.gradient = None;
    }

    /// Whether the tap is currently attached.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Record the layer's forward output, overwriting any prior capture.
    ///
    /// Clears any previously captured gradient: a gradient is only valid
    /// together with the activation of the same forward pass. Ignored when
    /// the tap is detached.
    pub fn capture_forward(&mut self, activation: Tensor<B, 4>) {
        if !self.attached {
            tracing::debug!("Forward capture ignored on detached tap");
            return;
        }
        self.activation = Some(activation);
        self.gradient = None;
    }

    /// Record the gradient flowing into the layer's output, overwriting any
    /// prior capture. Ignored when the tap is detached.
    pub fn capture_backward(&mut self, gradient: Tensor<B, 4>) {
        if !self.attached {
            tracing::debug!("Backward capture ignored on detached tap");
            return;
        }
        self.gradient = Some(gradient);
    }

    /// Take the captured activation/gradient pair, consuming it.
    ///
    /// Fails when the tap is detached or when either half of the
    /// forward/backward cycle is missing, so an out-of-order analysis can
    /// never synthesize a CAM from stale or absent tensors.
    pub fn take_captured(&mut self) -> Result<(Tensor<B, 4>, Tensor<B, 4>)> {
        if !self.attached {
            return Err(ExplainError::Detached);
        }
        let activation = self.activation.take().ok_or(ExplainError::MissingActivation)?;
        let gradient = self.gradient.take().ok_or(ExplainError::MissingGradient)?;
        Ok((activation, gradient))
    }
}

impl<B: Backend> Default for LayerTap<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped attachment of a [`LayerTap`].
///
/// Detaches the tap when dropped, so observation points are released even
/// on error paths and can never leak across repeated analyses in a
/// long-lived process.
#[derive(Debug)]
pub struct TapGuard<'a, B: Backend> {
    tap: &'a mut LayerTap<B>,
}

impl<'a, B: Backend> TapGuard<'a, B> {
    /// Attach the tap, returning a guard that detaches it on drop.
    pub fn attach(tap: &'a mut LayerTap<B>) -> Result<Self> {
        tap.attach()?;
        Ok(Self { tap })
    }
}

impl<B: Backend> std::ops::Deref for TapGuard<'_, B> {
    type Target = LayerTap<B>;

    fn deref(&self) -> &Self::Target {
        self.tap
    }
}

impl<B: Backend> std::ops::DerefMut for TapGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tap
    }
}

impl<B: Backend> Drop for TapGuard<'_, B> {
    fn drop(&mut self) {
        self.tap.detach();
    }
}
