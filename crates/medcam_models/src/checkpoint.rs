//! Checkpoint persistence for the scan classifier.
//!
//! A checkpoint is a directory bundling the trained weights with the
//! ordered class list they were trained against:
//!
//! - `meta.json` — architecture name, ordered class names, model config
//! - `model.mpk` — weights in Burn's named MessagePack record format
//!
//! Any structural mismatch (missing files, unparsable metadata, class count
//! disagreeing with the config) is fatal at load time.

use std::path::Path;

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use serde::{Deserialize, Serialize};

use medcam_core::ClassRegistry;

use crate::error::{ModelError, Result};
use crate::resnet::{ScanResNet, ScanResNetConfig};

/// Architecture identifier written into checkpoint metadata.
pub const ARCH_NAME: &str = "ScanResNet";

/// Metadata file name inside a checkpoint directory.
pub const META_FILE: &str = "meta.json";

/// Weights file name inside a checkpoint directory (written by the
/// recorder, which appends the `.mpk` extension to the stem).
pub const WEIGHTS_FILE: &str = "model.mpk";

const WEIGHTS_STEM: &str = "model";

/// Checkpoint metadata: everything needed to rebuild the classifier
/// besides the weights themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Model architecture name.
    pub arch: String,
    /// Ordered class names matching the head's output order.
    pub classes: Vec<String>,
    /// Model configuration.
    pub config: ScanResNetConfig,
}

/// A checkpoint loaded back into memory.
#[derive(Debug)]
pub struct LoadedCheckpoint<B: Backend> {
    /// The model with restored weights.
    pub model: ScanResNet<B>,
    /// The class registry from the checkpoint metadata.
    pub registry: ClassRegistry,
    /// The model configuration from the checkpoint metadata.
    pub config: ScanResNetConfig,
}

/// Save a model, its class list and its config into a checkpoint directory.
///
/// The directory is created if absent. Fails with
/// [`ModelError::ClassCountMismatch`] when the registry size disagrees with
/// the config's declared class count.
pub fn save_checkpoint<B: Backend>(
    model: &ScanResNet<B>,
    registry: &ClassRegistry,
    config: &ScanResNetConfig,
    dir: impl AsRef<Path>,
) -> Result<()> {
    let dir = dir.as_ref();

    if registry.len() != config.n_classes {
        return Err(ModelError::ClassCountMismatch {
            meta: registry.len(),
            config: config.n_classes,
        });
    }

    std::fs::create_dir_all(dir).map_err(|e| ModelError::Save(e.to_string()))?;

    let meta = CheckpointMeta {
        arch: ARCH_NAME.to_string(),
        classes: registry.names().to_vec(),
        config: config.clone(),
    };
    let meta_json =
        serde_json::to_string_pretty(&meta).map_err(|e| ModelError::Save(e.to_string()))?;
    std::fs::write(dir.join(META_FILE), meta_json)
        .map_err(|e| ModelError::Save(e.to_string()))?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(model.clone().into_record(), dir.join(WEIGHTS_STEM))
        .map_err(|e| ModelError::Save(e.to_string()))?;

    tracing::info!("Saved checkpoint to {:?}", dir);
    Ok(())
}

/// Load a checkpoint directory back into a model plus its class registry.
///
/// Fails with [`ModelError::NotFound`] when the directory or either of its
/// files is missing, and with [`ModelError::Load`] /
/// [`ModelError::ClassCountMismatch`] on structural problems.
pub fn load_checkpoint<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<LoadedCheckpoint<B>> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Err(ModelError::NotFound(dir.to_path_buf()));
    }

    let meta_path = dir.join(META_FILE);
    if !meta_path.exists() {
        return Err(ModelError::NotFound(meta_path));
    }

    let meta_json =
        std::fs::read_to_string(&meta_path).map_err(|e| ModelError::Load(e.to_string()))?;
    let meta: CheckpointMeta =
        serde_json::from_str(&meta_json).map_err(|e| ModelError::Load(e.to_string()))?;

    if meta.arch != ARCH_NAME {
        return Err(ModelError::Load(format!(
            "Unsupported architecture '{}', expected '{}'",
            meta.arch, ARCH_NAME
        )));
    }

    let registry = ClassRegistry::from_names(meta.classes.iter().cloned())?;
    if registry.len() != meta.config.n_classes {
        return Err(ModelError::ClassCountMismatch {
            meta: registry.len(),
            config: meta.config.n_classes,
        });
    }

    let weights_path = dir.join(WEIGHTS_FILE);
    if !weights_path.exists() {
        return Err(ModelError::NotFound(weights_path));
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(dir.join(WEIGHTS_STEM), device)
        .map_err(|e| ModelError::Load(e.to_string()))?;

    let model = meta.config.init::<B>(device).load_record(record);

    tracing::info!(
        "Loaded checkpoint from {:?} ({} classes)",
        dir,
        registry.len()
    );

    Ok(LoadedCheckpoint {
        model,
        registry,
        config: meta.config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn small_config(n_classes: usize) -> ScanResNetConfig {
        ScanResNetConfig {
            n_channels: 3,
            n_classes,
            stem_filters: 4,
            n_filters: vec![4, 8],
            blocks_per_stage: 1,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let device = Default::default();
        let config = small_config(2);
        let model: ScanResNet<TestBackend> = config.init(&device);
        let registry = ClassRegistry::from_names(["glioma", "normal"]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        save_checkpoint(&model, &registry, &config, dir.path()).unwrap();

        assert!(dir.path().join(META_FILE).exists());
        assert!(dir.path().join(WEIGHTS_FILE).exists());

        let loaded: LoadedCheckpoint<TestBackend> =
            load_checkpoint(dir.path(), &device).unwrap();
        assert_eq!(loaded.registry, registry);

        // Restored weights must reproduce the original predictions exactly
        let x = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &device);
        let before = model.forward(x.clone());
        let after = loaded.model.forward(x);
        let diff: f32 = (before - after).abs().sum().into_scalar().elem();
        assert!(diff < 1e-6, "Predictions diverged after roundtrip: {}", diff);
    }

    #[test]
    fn test_missing_checkpoint() {
        let device = <TestBackend as Backend>::Device::default();
        let result = load_checkpoint::<TestBackend>("/nonexistent/checkpoint", &device);
        match result {
            Err(ModelError::NotFound(path)) => {
                assert!(path.to_string_lossy().contains("/nonexistent/checkpoint"));
            }
            other => panic!("Expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_save_class_count_mismatch() {
        let device = Default::default();
        let config = small_config(3);
        let model: ScanResNet<TestBackend> = config.init(&device);
        let registry = ClassRegistry::from_names(["glioma", "normal"]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = save_checkpoint(&model, &registry, &config, dir.path());
        assert!(matches!(
            result,
            Err(ModelError::ClassCountMismatch { meta: 2, config: 3 })
        ));
    }

    #[test]
    fn test_corrupt_metadata() {
        let device = <TestBackend as Backend>::Device::default();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(META_FILE), "not json").unwrap();

        let result = load_checkpoint::<TestBackend>(dir.path(), &device);
        assert!(matches!(result, Err(ModelError::Load(_))));
    }
}
