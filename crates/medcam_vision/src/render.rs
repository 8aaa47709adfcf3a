//! Rendering class-activation maps into heatmap and overlay images.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use medcam_explain::Cam;

use crate::error::{Result, VisionError};

/// Filename of the standalone heatmap artifact.
pub const HEATMAP_FILE: &str = "gradcam_heatmap.png";
/// Filename of the overlay artifact.
pub const OVERLAY_FILE: &str = "gradcam_overlay.png";

/// Absolute paths of the two written artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Standalone colorized heatmap.
    pub heatmap: PathBuf,
    /// Heatmap blended over the resized input scan.
    pub overlay: PathBuf,
}

// Blue-to-red anchors sampled at equal spacing; linear interpolation
// between neighbors.
const COLOR_ANCHORS: [[f32; 3]; 5] = [
    [0.0, 0.0, 255.0],
    [0.0, 255.0, 255.0],
    [0.0, 255.0, 0.0],
    [255.0, 255.0, 0.0],
    [255.0, 0.0, 0.0],
];

/// Map an importance value in `[0, 1]` to a heat color.
fn colormap(v: f32) -> Rgb<u8> {
    let v = v.clamp(0.0, 1.0);
    let scaled = v * (COLOR_ANCHORS.len() - 1) as f32;
    let idx = (scaled.floor() as usize).min(COLOR_ANCHORS.len() - 2);
    let frac = scaled - idx as f32;

    let lo = COLOR_ANCHORS[idx];
    let hi = COLOR_ANCHORS[idx + 1];
    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = (lo[c] + (hi[c] - lo[c]) * frac).round() as u8;
    }
    Rgb(out)
}

/// Render a [`Cam`] as a standalone colorized heatmap.
pub fn render_heatmap(cam: &Cam) -> RgbImage {
    let (w, h) = (cam.width() as u32, cam.height() as u32);
    RgbImage::from_fn(w, h, |x, y| colormap(cam.at(x as usize, y as usize)))
}

/// Blend the colorized [`Cam`] over a base image.
///
/// `alpha` is the heatmap weight; the base keeps `1 - alpha`. The base
/// image must already be resized to the map's resolution.
pub fn render_overlay(base: &RgbImage, cam: &Cam, alpha: f32) -> Result<RgbImage> {
    if base.width() as usize != cam.width() || base.height() as usize != cam.height() {
        return Err(VisionError::SizeMismatch {
            image_w: base.width(),
            image_h: base.height(),
            map_w: cam.width() as u32,
            map_h: cam.height() as u32,
        });
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let out = RgbImage::from_fn(base.width(), base.height(), |x, y| {
        let bg = base.get_pixel(x, y).0;
        let heat = colormap(cam.at(x as usize, y as usize)).0;
        let mut blended = [0u8; 3];
        for c in 0..3 {
            let v = bg[c] as f32 * (1.0 - alpha) + heat[c] as f32 * alpha;
            blended[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(blended)
    });
    Ok(out)
}

/// Write the heatmap and overlay into `out_dir`, creating it if needed.
///
/// Either both artifacts land on disk or neither does: if the overlay
/// write fails after the heatmap succeeded, the heatmap is removed again
/// before the error is returned.
pub fn write_artifacts(
    out_dir: impl AsRef<Path>,
    heatmap: &RgbImage,
    overlay: &RgbImage,
) -> Result<ArtifactPaths> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let heatmap_path = out_dir.join(HEATMAP_FILE);
    let overlay_path = out_dir.join(OVERLAY_FILE);

    heatmap.save(&heatmap_path).map_err(|source| VisionError::Save {
        path: heatmap_path.clone(),
        source,
    })?;

    if let Err(source) = overlay.save(&overlay_path) {
        let _ = std::fs::remove_file(&heatmap_path);
        return Err(VisionError::Save {
            path: overlay_path,
            source,
        });
    }

    let paths = ArtifactPaths {
        heatmap: std::fs::canonicalize(&heatmap_path)?,
        overlay: std::fs::canonicalize(&overlay_path)?,
    };
    tracing::info!(
        "Wrote artifacts: {} and {}",
        paths.heatmap.display(),
        paths.overlay.display()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use burn::prelude::*;
    use medcam_explain::synthesize;

    fn test_cam(size: usize) -> Cam {
        let device = Default::default();
        let mut values = Vec::with_capacity(size * size);
        for i in 0..size * size {
            values.push(i as f32);
        }
        let act = Tensor::<NdArray, 1>::from_floats(values.as_slice(), &device)
            .reshape([1, 1, size, size]);
        let grad = Tensor::<NdArray, 4>::ones([1, 1, size, size], &device);
        synthesize(act, grad, [size, size]).unwrap()
    }

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(colormap(0.0), Rgb([0, 0, 255]));
        assert_eq!(colormap(1.0), Rgb([255, 0, 0]));
        assert_eq!(colormap(0.5), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_colormap_clamps_out_of_range() {
        assert_eq!(colormap(-2.0), colormap(0.0));
        assert_eq!(colormap(3.0), colormap(1.0));
    }

    #[test]
    fn test_heatmap_dimensions_match_cam() {
        let cam = test_cam(8);
        let img = render_heatmap(&cam);
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 8);
    }

    #[test]
    fn test_overlay_rejects_mismatched_sizes() {
        let cam = test_cam(8);
        let base = RgbImage::new(16, 16);
        let result = render_overlay(&base, &cam, 0.45);
        assert!(matches!(result, Err(VisionError::SizeMismatch { .. })));
    }

    #[test]
    fn test_overlay_with_zero_alpha_is_base() {
        let cam = test_cam(4);
        let base = RgbImage::from_pixel(4, 4, Rgb([120, 60, 30]));
        let out = render_overlay(&base, &cam, 0.0).unwrap();
        for (a, b) in base.pixels().zip(out.pixels()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_overlay_with_full_alpha_is_heatmap() {
        let cam = test_cam(4);
        let base = RgbImage::from_pixel(4, 4, Rgb([120, 60, 30]));
        let out = render_overlay(&base, &cam, 1.0).unwrap();
        let heat = render_heatmap(&cam);
        for (a, b) in heat.pixels().zip(out.pixels()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_write_artifacts_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("results");
        let cam = test_cam(4);
        let heatmap = render_heatmap(&cam);
        let base = RgbImage::new(4, 4);
        let overlay = render_overlay(&base, &cam, 0.45).unwrap();

        let paths = write_artifacts(&out_dir, &heatmap, &overlay).unwrap();
        assert!(paths.heatmap.is_absolute());
        assert!(paths.overlay.is_absolute());
        assert!(paths.heatmap.exists());
        assert!(paths.overlay.exists());
        assert!(paths.heatmap.ends_with(HEATMAP_FILE));
        assert!(paths.overlay.ends_with(OVERLAY_FILE));
    }
}
