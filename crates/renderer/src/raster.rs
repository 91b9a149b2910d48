//! Grid and legend rasterization.
//!
//! Both functions are pure: identical inputs give identical pixels. Cells
//! whose value has no color (NaN) stay fully transparent.

use grid_codec::DecodedGrid;
use image::RgbaImage;
use rayon::prelude::*;

use crate::ColorMap;

/// Default size of a dynamic-colormap legend strip.
pub const LEGEND_WIDTH: u32 = 200;
pub const LEGEND_HEIGHT: u32 = 20;

/// Rows below this are rasterized on the calling thread.
const PARALLEL_ROWS: usize = 64;

/// Render one pixel per grid cell through `cmap`.
pub fn to_image(grid: &DecodedGrid, cmap: &ColorMap, vmin: f32, vmax: f32) -> RgbaImage {
    let width = grid.width();
    let mut image = RgbaImage::new(width as u32, grid.height() as u32);
    let row_bytes = width * 4;

    let paint_row = |(y, out): (usize, &mut [u8])| {
        let Some(values) = grid.row(y) else { return };
        for (px, &v) in out.chunks_exact_mut(4).zip(values) {
            if let Some(rgb) = cmap.map(vmin, vmax, v) {
                px.copy_from_slice(&rgb.to_rgba());
            }
        }
    };

    if grid.height() >= PARALLEL_ROWS {
        image
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(paint_row);
    } else {
        image.chunks_mut(row_bytes).enumerate().for_each(paint_row);
    }
    image
}

/// Value represented by legend column `x` of a `width`-wide strip.
#[inline]
pub fn legend_value(vmin: f32, vmax: f32, width: u32, x: u32) -> f32 {
    let frac = (x as f64 + 0.5) / width.max(1) as f64;
    (vmin as f64 + frac * (vmax as f64 - vmin as f64)) as f32
}

/// Render a horizontal legend strip, low values on the left.
pub fn to_legend(cmap: &ColorMap, vmin: f32, vmax: f32, height: u32, width: u32) -> RgbaImage {
    let column: Vec<[u8; 4]> = (0..width)
        .map(|x| {
            cmap.map(vmin, vmax, legend_value(vmin, vmax, width, x))
                .map(|rgb| rgb.to_rgba())
                .unwrap_or([0, 0, 0, 0])
        })
        .collect();
    RgbaImage::from_fn(width, height, |x, _| image::Rgba(column[x as usize]))
}
