//! PNG encoding and decoding for rendered layers.
//!
//! Rasterized layers and legends use few distinct colors, so the encoder
//! first tries an indexed PNG (color type 3) and only falls back to full
//! RGBA (color type 6) when the image has more than 256 colors.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::{RenderError, Result};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode an image, choosing indexed or RGBA output by color count.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    match Palette::extract(image.as_raw()) {
        Some(palette) => encode_indexed(image.width(), image.height(), &palette),
        None => encode_png_rgba(image),
    }
}

/// Encode an image as an RGBA PNG.
pub fn encode_png_rgba(image: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let idat = deflate_scanlines(image.as_raw(), width as usize * 4, height as usize)?;

    let mut png = Vec::with_capacity(idat.len() + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_RGBA));
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Decode a PNG (any color type) into RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| RenderError::encode(format!("PNG decode failed: {}", e)))
}

/// Distinct colors of an image plus one index per pixel.
struct Palette {
    colors: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl Palette {
    /// Build a palette, or `None` when the image has too many colors.
    fn extract(pixels: &[u8]) -> Option<Self> {
        let colors = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
            Self::distinct_parallel(pixels)?
        } else {
            Self::distinct(pixels)?
        };

        let lookup: HashMap<u32, u8> = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (u32::from_le_bytes(*c), i as u8))
            .collect();

        let indices = pixels
            .par_chunks_exact(4)
            .map(|px| {
                lookup
                    .get(&u32::from_le_bytes([px[0], px[1], px[2], px[3]]))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();

        Some(Self { colors, indices })
    }

    /// Colors in first-seen order.
    fn distinct(pixels: &[u8]) -> Option<Vec<[u8; 4]>> {
        let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
        let mut colors = Vec::with_capacity(MAX_PALETTE_SIZE);
        for px in pixels.chunks_exact(4) {
            let color = [px[0], px[1], px[2], px[3]];
            if seen.insert(u32::from_le_bytes(color)) {
                if colors.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                colors.push(color);
            }
        }
        Some(colors)
    }

    /// Per-thread color sets merged at the end; order is unspecified.
    fn distinct_parallel(pixels: &[u8]) -> Option<Vec<[u8; 4]>> {
        let merged = pixels
            .par_chunks_exact(4)
            .fold(HashSet::new, |mut set, px| {
                if set.len() <= MAX_PALETTE_SIZE {
                    set.insert(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
                }
                set
            })
            .reduce(HashSet::new, |mut a, b| {
                if a.len() <= MAX_PALETTE_SIZE {
                    a.extend(b);
                }
                a
            });

        if merged.len() > MAX_PALETTE_SIZE {
            return None;
        }
        let mut colors: Vec<u32> = merged.into_iter().collect();
        colors.sort_unstable();
        Some(colors.into_iter().map(u32::to_le_bytes).collect())
    }
}

fn encode_indexed(width: u32, height: u32, palette: &Palette) -> Result<Vec<u8>> {
    let idat = deflate_scanlines(&palette.indices, width as usize, height as usize)?;

    let mut png = Vec::with_capacity(idat.len() + palette.colors.len() * 4 + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_INDEXED));

    let plte: Vec<u8> = palette.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only when some entry is not fully opaque
    if palette.colors.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.colors.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_len: usize, rows: usize) -> Result<Vec<u8>> {
    if data.len() != row_len * rows {
        return Err(RenderError::encode(format!(
            "expected {} bytes of pixel data, got {}",
            row_len * rows,
            data.len()
        )));
    }

    let mut raw = Vec::with_capacity(rows * (row_len + 1));
    for row in data.chunks_exact(row_len.max(1)).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| RenderError::encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::encode(format!("IDAT compression failed: {}", e)))
}
