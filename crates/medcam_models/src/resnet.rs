//! Residual convolutional classifier for medical scan images.

use burn::nn::{
    conv::{Conv2d, Conv2dConfig},
    pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
    BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
};
use burn::prelude::*;
use burn::tensor::activation::softmax;
use serde::{Deserialize, Serialize};

/// Configuration for the ScanResNet model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResNetConfig {
    /// Number of input color channels.
    pub n_channels: usize,
    /// Number of output classes.
    pub n_classes: usize,
    /// Number of filters in the stem convolution.
    pub stem_filters: usize,
    /// Number of filters in each residual stage.
    pub n_filters: Vec<usize>,
    /// Number of residual blocks per stage.
    pub blocks_per_stage: usize,
}

impl Default for ScanResNetConfig {
    fn default() -> Self {
        Self {
            n_channels: 3,
            n_classes: 2,
            stem_filters: 32,
            n_filters: vec![32, 64, 128, 256],
            blocks_per_stage: 2,
        }
    }
}

impl ScanResNetConfig {
    /// Create a new config for the given class count.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            ..Default::default()
        }
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ScanResNet<B> {
        ScanResNet::new(self.clone(), device)
    }
}

/// Residual block with two 3x3 convolutions and a projection shortcut.
#[derive(Module, Debug)]
pub struct ScanBlock<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    shortcut: Option<Conv2d<B>>,
    shortcut_bn: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> ScanBlock<B> {
    /// Create a new residual block. A stride of 2 on the first convolution
    /// halves the spatial resolution.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        device: &B::Device,
    ) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        // Projection shortcut when channel count or resolution changes
        let (shortcut, shortcut_bn) = if in_channels != out_channels || stride != 1 {
            let sc = Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device);
            let sc_bn = BatchNormConfig::new(out_channels).init(device);
            (Some(sc), Some(sc_bn))
        } else {
            (None, None)
        };

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            shortcut,
            shortcut_bn,
        }
    }

    /// Forward pass.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let relu = Relu::new();

        let out = self.conv1.forward(x.clone());
        let out = self.bn1.forward(out);
        let out = relu.forward(out);

        let out = self.conv2.forward(out);
        let out = self.bn2.forward(out);

        let shortcut = match (&self.shortcut, &self.shortcut_bn) {
            (Some(sc), Some(sc_bn)) => sc_bn.forward(sc.forward(x)),
            _ => x,
        };

        let out = out + shortcut;
        relu.forward(out)
    }
}

/// Residual convolutional network for scan image classification.
///
/// A stem convolution followed by residual stages, global average pooling
/// and a linear classification head. The output of the last residual stage
/// is the designated layer for Grad-CAM instrumentation, so the forward
/// pass is exposed in two halves: [`ScanResNet::forward_features`] and
/// [`ScanResNet::forward_head`].
#[derive(Module, Debug)]
pub struct ScanResNet<B: Backend> {
    stem_conv: Conv2d<B>,
    stem_bn: BatchNorm<B, 2>,
    stem_pool: MaxPool2d,
    blocks: Vec<ScanBlock<B>>,
    gap: AdaptiveAvgPool2d,
    fc: Linear<B>,
}

impl<B: Backend> ScanResNet<B> {
    /// Create a new ScanResNet model.
    pub fn new(config: ScanResNetConfig, device: &B::Device) -> Self {
        let stem_conv = Conv2dConfig::new([config.n_channels, config.stem_filters], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let stem_bn = BatchNormConfig::new(config.stem_filters).init(device);
        let stem_pool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let mut blocks = Vec::new();
        let mut in_channels = config.stem_filters;
        for (stage, &out_channels) in config.n_filters.iter().enumerate() {
            for block_idx in 0..config.blocks_per_stage {
                // Downsample at the entry of every stage after the first
                let stride = if stage > 0 && block_idx == 0 { 2 } else { 1 };
                blocks.push(ScanBlock::new(in_channels, out_channels, stride, device));
                in_channels = out_channels;
            }
        }

        let gap = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let final_channels = *config.n_filters.last().unwrap_or(&config.stem_filters);
        let fc = LinearConfig::new(final_channels, config.n_classes).init(device);

        Self {
            stem_conv,
            stem_bn,
            stem_pool,
            blocks,
            gap,
            fc,
        }
    }

    /// Run the convolutional backbone, returning the output of the last
    /// residual stage with shape `(batch, channels, h, w)`.
    pub fn forward_features(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let relu = Relu::new();

        let out = self.stem_conv.forward(x);
        let out = self.stem_bn.forward(out);
        let out = relu.forward(out);
        let mut out = self.stem_pool.forward(out);

        for block in &self.blocks {
            out = block.forward(out);
        }

        out
    }

    /// Run the classification head on backbone features, returning raw
    /// class scores with shape `(batch, n_classes)`.
    pub fn forward_head(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let out = self.gap.forward(features);
        let [batch, channels, _, _] = out.dims();
        let out = out.reshape([batch, channels]);
        self.fc.forward(out)
    }

    /// Full forward pass returning raw class scores.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.forward_features(x);
        self.forward_head(features)
    }

    /// Forward pass returning class probabilities.
    pub fn forward_probs(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        softmax(logits, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> ScanResNetConfig {
        ScanResNetConfig {
            n_channels: 3,
            n_classes: 2,
            stem_filters: 4,
            n_filters: vec![4, 8],
            blocks_per_stage: 1,
        }
    }

    #[test]
    fn test_config_default() {
        let config = ScanResNetConfig::default();
        assert_eq!(config.n_channels, 3);
        assert_eq!(config.n_filters, vec![32, 64, 128, 256]);
        assert_eq!(config.blocks_per_stage, 2);
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model: ScanResNet<TestBackend> = small_config().init(&device);

        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let features = model.forward_features(x.clone());

        // 32 -> stem conv /2 -> 16 -> pool /2 -> 8 -> stage 2 entry /2 -> 4
        assert_eq!(features.dims(), [1, 8, 4, 4]);

        let logits = model.forward_head(features);
        assert_eq!(logits.dims(), [1, 2]);

        let full = model.forward(x);
        assert_eq!(full.dims(), [1, 2]);
    }

    #[test]
    fn test_forward_probs_sum_to_one() {
        let device = Default::default();
        let model: ScanResNet<TestBackend> = small_config().init(&device);

        let x = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let probs = model.forward_probs(x);

        let sum: f32 = probs.sum().into_scalar().elem();
        assert!((sum - 1.0).abs() < 1e-5, "Probabilities sum to {}", sum);
    }

    #[test]
    fn test_split_forward_matches_full_forward() {
        let device = Default::default();
        let model: ScanResNet<TestBackend> = small_config().init(&device);

        let x = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let split = model.forward_head(model.forward_features(x.clone()));
        let full = model.forward(x);

        let diff: f32 = (split - full).abs().sum().into_scalar().elem();
        assert!(diff < 1e-6);
    }
}
