//! Test data generators for grids, colormaps and images.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite.

use image::{Rgba, RgbaImage};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a horizontal ramp from `lo` at column 0 to `hi` at the last column.
///
/// Every row is identical, so a rasterized ramp shows each colormap bucket
/// as a vertical band.
pub fn create_ramp_grid(width: usize, height: usize, lo: f32, hi: f32) -> Vec<f32> {
    let step = if width > 1 {
        (hi - lo) / (width - 1) as f32
    } else {
        0.0
    };
    let row: Vec<f32> = (0..width).map(|col| lo + step * col as f32).collect();
    row.iter().copied().cycle().take(width * height).collect()
}

/// Creates a grid with NaN values at specified positions.
///
/// Useful for testing missing data handling.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `nan_positions` - List of (col, row) positions that should be NaN
///
/// # Returns
///
/// A `Vec<f32>` with NaN at specified positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Encodes a grid into the gzip wire format.
///
/// Panics on invalid shapes; intended for fixtures only.
pub fn encode_test_grid(width: usize, height: usize, values: &[f32]) -> Vec<u8> {
    grid_codec::encode_grid(width, height, values).expect("fixture grid must be well-formed")
}

/// Colormap JSON with `n` entries ramping from black to white.
///
/// Entry `i` is `[i/(n-1), i/(n-1), i/(n-1)]`, so bucket `i` maps to grey
/// level `round(255 * i/(n-1))`.
pub fn ramp_colormap_json(n: usize) -> String {
    let entries: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            serde_json::json!([t, t, t])
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

/// Colormap JSON from explicit 0..1 RGB triples.
pub fn colormap_json(entries: &[[f64; 3]]) -> String {
    serde_json::to_string(entries).expect("colormap entries serialize")
}

/// Creates a solid-color image.
pub fn create_solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Creates an image whose red channel encodes the column and green the row.
pub fn create_test_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = ((x as f32 / width.max(1) as f32) * 255.0) as u8;
        let g = ((y as f32 / height.max(1) as f32) * 255.0) as u8;
        Rgba([r, g, 128, 255])
    })
}

/// Encodes an image as PNG bytes.
pub fn encode_test_png(image: &RgbaImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("fixture image encodes");
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(3, 2);
        assert_eq!(grid, vec![0.0, 1000.0, 2000.0, 1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn test_ramp_grid_rows_repeat() {
        let grid = create_ramp_grid(5, 2, 0.0, 1.0);
        assert_eq!(&grid[..5], &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(&grid[5..], &grid[..5]);
    }

    #[test]
    fn test_grid_with_nans() {
        let grid = create_grid_with_nans(3, 3, &[(1, 1), (5, 5)]);
        assert!(grid[4].is_nan());
        assert_eq!(grid.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_ramp_colormap_json() {
        let parsed: Vec<[f64; 3]> = serde_json::from_str(&ramp_colormap_json(3)).unwrap();
        assert_eq!(parsed, vec![[0.0; 3], [0.5; 3], [1.0; 3]]);
    }

    #[test]
    fn test_encoded_grid_decodes() {
        let bytes = encode_test_grid(2, 2, &create_test_grid(2, 2));
        let grid = grid_codec::decode_grid(&bytes, "mem").unwrap();
        assert_eq!(grid.get(1, 1), Some(1001.0));
    }

    #[test]
    fn test_png_round_trip() {
        let img = create_test_image(4, 3);
        let decoded = image::load_from_memory(&encode_test_png(&img))
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded, img);
    }
}
