//! Inference wrapper holding the frozen classifier in evaluation mode.

use std::path::Path;

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;

use medcam_core::ClassRegistry;

use crate::checkpoint::{self, LoadedCheckpoint};
use crate::error::{ModelError, Result};
use crate::resnet::{ScanResNet, ScanResNetConfig};

/// A frozen scan classifier plus the class registry it was trained against.
///
/// Loaded once at startup and read-only afterwards. Plain prediction runs
/// on the non-autodiff inner backend (no gradient tracking); the
/// gradient-tracked head used for explanation runs under the autodiff
/// backend. Both share the same weights, so the two execution modes are
/// explicit entry points rather than an ambient flag.
#[derive(Debug)]
pub struct Classifier<B: AutodiffBackend> {
    model: ScanResNet<B>,
    eval_model: ScanResNet<B::InnerBackend>,
    registry: ClassRegistry,
    config: ScanResNetConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Classifier<B> {
    /// Load a classifier from a checkpoint directory.
    pub fn load(dir: impl AsRef<Path>, device: &B::Device) -> Result<Self> {
        let LoadedCheckpoint {
            model,
            registry,
            config,
        } = checkpoint::load_checkpoint::<B>(dir, device)?;

        Ok(Self::from_model(model, registry, config, device.clone()))
    }

    /// Build a classifier from an in-memory model and registry.
    ///
    /// Fails when the registry size disagrees with the config's declared
    /// class count.
    pub fn from_parts(
        model: ScanResNet<B>,
        registry: ClassRegistry,
        config: ScanResNetConfig,
        device: B::Device,
    ) -> Result<Self> {
        if registry.len() != config.n_classes {
            return Err(ModelError::ClassCountMismatch {
                meta: registry.len(),
                config: config.n_classes,
            });
        }
        Ok(Self::from_model(model, registry, config, device))
    }

    fn from_model(
        model: ScanResNet<B>,
        registry: ClassRegistry,
        config: ScanResNetConfig,
        device: B::Device,
    ) -> Self {
        let eval_model = model.clone().valid();
        Self {
            model,
            eval_model,
            registry,
            config,
            device,
        }
    }

    /// The class registry from the checkpoint.
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Number of output classes.
    pub fn n_classes(&self) -> usize {
        self.registry.len()
    }

    /// The model configuration.
    pub fn config(&self) -> &ScanResNetConfig {
        &self.config
    }

    /// The device holding the model weights.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Raw class scores for a preprocessed image, without gradient
    /// tracking.
    pub fn predict(&self, x: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 2> {
        self.eval_model.forward(x)
    }

    /// Class probabilities for a preprocessed image, without gradient
    /// tracking.
    pub fn predict_probs(&self, x: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 2> {
        softmax(self.predict(x), 1)
    }

    /// Backbone features (the designated layer's output), without gradient
    /// tracking.
    pub fn features(&self, x: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 4> {
        self.eval_model.forward_features(x)
    }

    /// Classification head on backbone features, without gradient tracking.
    pub fn forward_head(&self, features: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 2> {
        self.eval_model.forward_head(features)
    }

    /// Classification head under the autodiff backend.
    ///
    /// The head carries no batch normalization or dropout, so its output is
    /// identical to [`Classifier::forward_head`]; only gradient tracking
    /// differs.
    pub fn forward_head_tracked(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        self.model.forward_head(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray>;

    fn small_classifier() -> Classifier<TestBackend> {
        let device = <TestBackend as Backend>::Device::default();
        let config = ScanResNetConfig {
            n_channels: 3,
            n_classes: 2,
            stem_filters: 4,
            n_filters: vec![4, 8],
            blocks_per_stage: 1,
        };
        let model: ScanResNet<TestBackend> = config.init(&device);
        let registry = ClassRegistry::from_names(["glioma", "normal"]).unwrap();
        Classifier::from_parts(model, registry, config, device).unwrap()
    }

    #[test]
    fn test_predict_probs_sum_to_one() {
        let clf = small_classifier();
        let device = Default::default();
        let x = Tensor::<NdArray, 4>::ones([1, 3, 32, 32], &device);

        let probs = clf.predict_probs(x);
        assert_eq!(probs.dims(), [1, 2]);

        let sum: f32 = probs.sum().into_scalar().elem();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_tracked_head_matches_eval_head() {
        let clf = small_classifier();
        let device = Default::default();
        let x = Tensor::<NdArray, 4>::ones([1, 3, 32, 32], &device);

        let features = clf.features(x);
        let eval_logits = clf.forward_head(features.clone());

        let tracked = Tensor::<TestBackend, 4>::from_inner(features).require_grad();
        let tracked_logits = clf.forward_head_tracked(tracked).inner();

        let diff: f32 = (eval_logits - tracked_logits).abs().sum().into_scalar().elem();
        assert!(diff < 1e-6);
    }

    #[test]
    fn test_head_gradient_has_feature_shape() {
        let clf = small_classifier();
        let device = Default::default();
        let x = Tensor::<NdArray, 4>::ones([1, 3, 32, 32], &device);

        let features = clf.features(x);
        let dims = features.dims();

        let tracked = Tensor::<TestBackend, 4>::from_inner(features).require_grad();
        let logits = clf.forward_head_tracked(tracked.clone());
        let score = logits.slice([0..1, 0..1]).sum();

        let grads = score.backward();
        let grad = tracked.grad(&grads).expect("Feature gradient missing");
        assert_eq!(grad.dims(), dims);
    }

    #[test]
    fn test_from_parts_rejects_mismatched_registry() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ScanResNetConfig {
            n_channels: 3,
            n_classes: 3,
            stem_filters: 4,
            n_filters: vec![4],
            blocks_per_stage: 1,
        };
        let model: ScanResNet<TestBackend> = config.init(&device);
        let registry = ClassRegistry::from_names(["glioma", "normal"]).unwrap();

        let result = Classifier::from_parts(model, registry, config, device);
        assert!(matches!(
            result,
            Err(ModelError::ClassCountMismatch { meta: 2, config: 3 })
        ));
    }
}
