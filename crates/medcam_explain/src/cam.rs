//! Class-activation map synthesis from a captured activation/gradient pair.

use burn::prelude::*;

use crate::error::{ExplainError, Result};

/// A normalized spatial importance map.
///
/// Values are row-major, in `[0, 1]`, sized to the requested display
/// resolution.
#[derive(Debug, Clone)]
pub struct Cam {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl Cam {
    /// Map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major importance values in `[0, 1]`.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Importance at pixel `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// Combine a captured activation and gradient into a [`Cam`].
///
/// Channel weights are the spatial mean of the gradient; the map is the
/// weighted sum of activation channels, rectified, min-max normalized and
/// bilinearly upscaled to `output_size` (`[height, width]`).
///
/// Both tensors must have the identical `[batch, channels, h, w]` shape
/// from a single forward/backward cycle.
pub fn synthesize<B: Backend>(
    activation: Tensor<B, 4>,
    gradient: Tensor<B, 4>,
    output_size: [usize; 2],
) -> Result<Cam> {
    let act_dims = activation.dims();
    let grad_dims = gradient.dims();
    if act_dims != grad_dims {
        return Err(ExplainError::ShapeMismatch {
            expected: format!("{act_dims:?}"),
            got: format!("{grad_dims:?}"),
        });
    }
    let [_, _, src_h, src_w] = act_dims;

    // Spatial mean of the gradient per channel, kept as [b, c, 1, 1] so it
    // broadcasts over the activation
    let weights = gradient.mean_dim(3).mean_dim(2);

    // Weighted channel sum, rectified: only positively contributing
    // regions survive. Only the first batch element is explained.
    let cam = (activation * weights)
        .sum_dim(1)
        .clamp_min(0.0)
        .slice([0..1]);

    let raw: Vec<f32> = cam
        .into_data()
        .to_vec()
        .map_err(|e| ExplainError::Data(format!("{e:?}")))?;

    let normalized = min_max_normalize(&raw);
    let [out_h, out_w] = output_size;
    let values = resize_bilinear(&normalized, src_w, src_h, out_w, out_h);

    tracing::debug!(
        "Synthesized CAM: {}x{} -> {}x{}",
        src_w,
        src_h,
        out_w,
        out_h
    );

    Ok(Cam {
        values,
        width: out_w,
        height: out_h,
    })
}

/// Rescale values into `[0, 1]`.
///
/// The small denominator offset keeps a flat map finite (it collapses to
/// all zeros rather than NaN).
fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min + 1e-8;
    values.iter().map(|&v| (v - min) / range).collect()
}

/// Align-corners bilinear resize of a row-major grid.
fn resize_bilinear(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f32> {
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }

    let scale_x = if dst_w > 1 {
        (src_w - 1) as f32 / (dst_w - 1) as f32
    } else {
        0.0
    };
    let scale_y = if dst_h > 1 {
        (src_h - 1) as f32 / (dst_h - 1) as f32
    } else {
        0.0
    };

    let mut dst = Vec::with_capacity(dst_w * dst_h);
    for dy in 0..dst_h {
        let sy = dy as f32 * scale_y;
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;

        for dx in 0..dst_w {
            let sx = dx as f32 * scale_x;
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;

            let top = src[y0 * src_w + x0] * (1.0 - fx) + src[y0 * src_w + x1] * fx;
            let bottom = src[y1 * src_w + x0] * (1.0 - fx) + src[y1 * src_w + x1] * fx;
            dst.push(top * (1.0 - fy) + bottom * fy);
        }
    }
    dst
}
