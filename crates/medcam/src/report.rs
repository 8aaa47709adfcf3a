//! Analysis result and its human-readable rendering.

use std::path::PathBuf;

/// Everything one analysis produced: the prediction, the full probability
/// distribution, and the artifact locations.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Name of the predicted class.
    pub predicted_class: String,
    /// Index of the predicted class in the registry order.
    pub predicted_index: usize,
    /// Probability of the predicted class.
    pub confidence: f32,
    /// All class probabilities in registry order.
    pub class_probabilities: Vec<(String, f32)>,
    /// Absolute path of the standalone heatmap artifact.
    pub heatmap_path: PathBuf,
    /// Absolute path of the overlay artifact.
    pub overlay_path: PathBuf,
}

impl AnalysisReport {
    /// Render the report as the multi-line text summary printed by the
    /// command-line tool.
    pub fn render_text(&self) -> String {
        let name_width = self
            .class_probabilities
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(&format!(
            "Prediction: {} ({:.2}% confidence)\n",
            self.predicted_class,
            self.confidence * 100.0
        ));
        out.push_str("\nClass probabilities:\n");
        for (name, p) in &self.class_probabilities {
            out.push_str(&format!("  {name:<name_width$}  {p:.4}\n"));
        }
        out.push_str("\nSaved files:\n");
        out.push_str(&format!("  {}\n", self.heatmap_path.display()));
        out.push_str(&format!("  {}\n", self.overlay_path.display()));
        out
    }
}
