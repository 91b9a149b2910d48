//! Layer compositing.

use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use crate::{RenderError, Result};

/// Alpha-composite layers back to front.
///
/// Each entry is an image and an opacity in `0..=1` (clamped). A layer's
/// effective alpha is its pixel alpha times the opacity, and it is blended
/// "over" the running result with straight (non-premultiplied) alpha. The
/// result starts fully transparent and takes the first image's size.
pub fn flatten(layers: &[(&RgbaImage, f32)]) -> Result<RgbaImage> {
    let (first, _) = layers.first().ok_or(RenderError::NoLayers)?;
    let expected = first.dimensions();

    for (index, (image, _)) in layers.iter().enumerate() {
        if image.dimensions() != expected {
            return Err(RenderError::DimensionMismatch {
                index,
                expected,
                found: image.dimensions(),
            });
        }
    }

    let mut out = RgbaImage::new(expected.0, expected.1);
    for &(image, opacity) in layers {
        let opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        if opacity == 0.0 {
            continue;
        }
        out.par_chunks_mut(4)
            .zip(image.as_raw().par_chunks(4))
            .for_each(|(dst, src)| blend_over(dst, src, opacity));
    }

    debug!(
        layers = layers.len(),
        width = expected.0,
        height = expected.1,
        "Flattened layers"
    );
    Ok(out)
}

#[inline]
fn blend_over(dst: &mut [u8], src: &[u8], opacity: f32) {
    let a = src[3] as f32 / 255.0 * opacity;
    if a <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = a + da * (1.0 - a);

    for c in 0..3 {
        let s = src[c] as f32;
        let d = dst[c] as f32;
        dst[c] = ((s * a + d * da * (1.0 - a)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
