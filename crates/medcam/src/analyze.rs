//! The analysis pipeline: one image in, a prediction and two artifacts out.

use std::path::Path;

use burn::prelude::*;
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;

use medcam_explain::{synthesize, ExplainError, LayerTap, TapGuard};
use medcam_models::Classifier;
use medcam_vision::{self as vision, PreprocessConfig};

use crate::error::Result;
use crate::report::AnalysisReport;

/// Default weight of the heatmap when blending the overlay.
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.45;

/// The full explanation pipeline around a loaded [`Classifier`].
///
/// One `Explainer` serves any number of sequential analyses; each call to
/// [`Explainer::analyze`] owns its capture state, so no gradient or
/// activation leaks from one request into the next.
#[derive(Debug)]
pub struct Explainer<B: AutodiffBackend> {
    classifier: Classifier<B>,
    preprocess: PreprocessConfig,
    overlay_alpha: f32,
}

impl<B: AutodiffBackend> Explainer<B> {
    /// Wrap a loaded classifier with default preprocessing and blending.
    pub fn new(classifier: Classifier<B>) -> Self {
        Self {
            classifier,
            preprocess: PreprocessConfig::default(),
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
        }
    }

    /// Load the classifier from a checkpoint directory and wrap it.
    pub fn load(checkpoint_dir: impl AsRef<Path>, device: &B::Device) -> Result<Self> {
        let classifier = Classifier::load(checkpoint_dir, device)?;
        Ok(Self::new(classifier))
    }

    /// Override the preprocessing parameters.
    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Override the overlay blend weight.
    pub fn with_overlay_alpha(mut self, alpha: f32) -> Self {
        self.overlay_alpha = alpha;
        self
    }

    /// The wrapped classifier.
    pub fn classifier(&self) -> &Classifier<B> {
        &self.classifier
    }

    /// Classify one scan and explain the prediction.
    ///
    /// Runs the full pipeline: decode and normalize the image, forward
    /// pass with activation capture, softmax and class selection, backward
    /// pass from the predicted class score only, CAM synthesis, artifact
    /// rendering. The two PNG artifacts land in `out_dir`; both are
    /// written or neither is.
    pub fn analyze(
        &self,
        image_path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> Result<AnalysisReport> {
        let image_path = image_path.as_ref();
        tracing::info!("Analyzing {}", image_path.display());

        let rgb = vision::load_rgb(image_path)?;
        let input = vision::to_tensor::<B::InnerBackend>(
            &rgb,
            &self.preprocess,
            self.classifier.device(),
        );

        let mut tap: LayerTap<B::InnerBackend> = LayerTap::new();
        let mut tap = TapGuard::attach(&mut tap)?;

        // Backbone runs without gradient tracking (inference statistics in
        // the normalization layers); only the head is differentiated, with
        // the captured features as the gradient leaf.
        let features = self.classifier.features(input);
        tap.capture_forward(features.clone());

        let tracked = Tensor::<B, 4>::from_inner(features).require_grad();
        let logits = self.classifier.forward_head_tracked(tracked.clone());

        let probs: Vec<f32> = softmax(logits.clone().inner(), 1)
            .into_data()
            .to_vec()
            .map_err(|e| ExplainError::Data(format!("{e:?}")))?;

        let predicted_index = argmax_stable(&probs);
        let confidence = probs[predicted_index];
        let predicted_class = self
            .classifier
            .registry()
            .name(predicted_index)?
            .to_string();
        tracing::info!(
            "Predicted {} (index {}, {:.4})",
            predicted_class,
            predicted_index,
            confidence
        );

        // Backward from the predicted class score alone. The gradient set
        // is created here and dropped at the end of the call, so every
        // analysis starts from zero accumulated gradient.
        let score = logits
            .slice([0..1, predicted_index..predicted_index + 1])
            .sum();
        let grads = score.backward();
        let gradient = tracked.grad(&grads).ok_or(ExplainError::MissingGradient)?;
        tap.capture_backward(gradient);

        let (activation, gradient) = tap.take_captured()?;
        let size = self.preprocess.img_size;
        let cam = synthesize(activation, gradient, [size, size])?;

        let display = vision::resize_display(&rgb, size);
        let heatmap = vision::render_heatmap(&cam);
        let overlay = vision::render_overlay(&display, &cam, self.overlay_alpha)?;
        let paths = vision::write_artifacts(out_dir, &heatmap, &overlay)?;

        let class_probabilities = self
            .classifier
            .registry()
            .iter()
            .map(str::to_string)
            .zip(probs.iter().copied())
            .collect();

        Ok(AnalysisReport {
            predicted_class,
            predicted_index,
            confidence,
            class_probabilities,
            heatmap_path: paths.heatmap,
            overlay_path: paths.overlay,
        })
    }
}

/// Index of the largest value; the lowest index wins ties.
fn argmax_stable(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
