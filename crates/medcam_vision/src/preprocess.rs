//! Decoding scan images and normalizing them into model input tensors.

use std::path::Path;

use burn::prelude::*;
use image::imageops::FilterType;
use image::RgbImage;

use crate::error::{Result, VisionError};

/// Preprocessing parameters shared by training and inference.
///
/// Defaults follow the ImageNet convention the backbone was pretrained
/// under: 224x224 input, per-channel mean/std normalization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PreprocessConfig {
    /// Square model input size in pixels.
    pub img_size: usize,
    /// Per-channel normalization mean (RGB).
    pub mean: [f32; 3],
    /// Per-channel normalization standard deviation (RGB).
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            img_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// Decode an image file into RGB, discarding any alpha channel.
///
/// Grayscale scans are expanded to three identical channels by the
/// decoder, matching the model's expected input.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VisionError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path).map_err(|source| VisionError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "Decoded image {}: {}x{}",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img.to_rgb8())
}

/// Resize an image to the square display resolution with bilinear
/// filtering.
pub fn resize_display(img: &RgbImage, size: usize) -> RgbImage {
    image::imageops::resize(img, size as u32, size as u32, FilterType::Triangle)
}

/// Convert an RGB image into a normalized `[1, 3, S, S]` input tensor.
///
/// The image is resized to `config.img_size`, scaled to `[0, 1]`, then
/// normalized per channel with the config's mean and std.
pub fn to_tensor<B: Backend>(
    img: &RgbImage,
    config: &PreprocessConfig,
    device: &B::Device,
) -> Tensor<B, 4> {
    let size = config.img_size;
    let resized = resize_display(img, size);

    // HWC bytes to CHW floats
    let mut data = vec![0.0f32; 3 * size * size];
    for (y, row) in resized.rows().enumerate() {
        for (x, pixel) in row.enumerate() {
            for c in 0..3 {
                let v = pixel.0[c] as f32 / 255.0;
                data[c * size * size + y * size + x] = (v - config.mean[c]) / config.std[c];
            }
        }
    }

    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([1, 3, size, size])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::Rgb;

    type TestBackend = NdArray;

    fn solid_image(w: u32, h: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(color))
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_rgb("/nonexistent/scan.png").unwrap_err();
        match err {
            VisionError::NotFound(path) => {
                assert!(path.to_string_lossy().contains("scan.png"));
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_undecodable_file_reports_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let err = load_rgb(&path).unwrap_err();
        assert!(matches!(err, VisionError::Decode { .. }));
    }

    #[test]
    fn test_tensor_shape_and_normalization() {
        let config = PreprocessConfig {
            img_size: 8,
            ..Default::default()
        };
        let img = solid_image(16, 16, [255, 0, 0]);
        let device = Default::default();

        let tensor = to_tensor::<TestBackend>(&img, &config, &device);
        assert_eq!(tensor.dims(), [1, 3, 8, 8]);

        let values: Vec<f32> = tensor.into_data().to_vec().unwrap();
        // Red channel: (1.0 - mean) / std, uniform over the plane
        let expected_r = (1.0 - config.mean[0]) / config.std[0];
        let expected_g = (0.0 - config.mean[1]) / config.std[1];
        assert!((values[0] - expected_r).abs() < 1e-4);
        assert!((values[8 * 8] - expected_g).abs() < 1e-4);
    }

    #[test]
    fn test_resize_display_is_exact_size() {
        let img = solid_image(100, 40, [10, 20, 30]);
        let resized = resize_display(&img, 224);
        assert_eq!(resized.width(), 224);
        assert_eq!(resized.height(), 224);
    }
}
