//! Tests for PNG encoding functionality.
//!
//! Both encoder modes must round-trip through a standard PNG decoder.

use image::{Rgba, RgbaImage};
use renderer::{decode_png, encode_png, encode_png_rgba, to_legend, ColorMap};
use test_utils::ramp_colormap_json;

// ============================================================================
// Helper functions
// ============================================================================

/// Image with more than 256 distinct colors
fn many_colors(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, (x ^ y) as u8, 255]))
}

fn color_type(png: &[u8]) -> u8 {
    // IHDR data starts after signature (8) + length (4) + type (4)
    png[8 + 8 + 9]
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_indexed_round_trip_with_transparency() {
    let mut img = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]));
    img.put_pixel(2, 1, Rgba([0, 0, 0, 0]));
    img.put_pixel(5, 3, Rgba([200, 100, 50, 128]));

    let png = encode_png(&img).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(color_type(&png), 3);
    assert_eq!(decode_png(&png).unwrap(), img);
}

#[test]
fn test_rgba_fallback_round_trip() {
    let img = many_colors(40, 40);
    let png = encode_png(&img).unwrap();
    assert_eq!(color_type(&png), 6);
    assert_eq!(decode_png(&png).unwrap(), img);
}

#[test]
fn test_large_indexed_round_trip() {
    // 128x128 takes the parallel palette path
    let cmap = ColorMap::from_json("greys", ramp_colormap_json(16).as_bytes()).unwrap();
    let legend = to_legend(&cmap, 0.0, 1.0, 128, 128);
    let png = encode_png(&legend).unwrap();
    assert_eq!(color_type(&png), 3);
    assert_eq!(decode_png(&png).unwrap(), legend);
}

#[test]
fn test_indexed_smaller_than_rgba() {
    let cmap = ColorMap::from_json("greys", ramp_colormap_json(8).as_bytes()).unwrap();
    let legend = to_legend(&cmap, 0.0, 1.0, 64, 256);
    let indexed = encode_png(&legend).unwrap();
    let rgba = encode_png_rgba(&legend).unwrap();
    assert!(indexed.len() < rgba.len());
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(decode_png(b"not a png").is_err());
}
