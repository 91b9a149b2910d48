//! Encoding and decoding of the gzip-wrapped grid payload.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

use crate::{CodecError, DecodedGrid, Result};

/// Bytes taken by the `height`/`width` header.
pub const HEADER_LEN: usize = 8;

/// Decompress and decode a grid fetched from `url`.
///
/// A gzip stream that cannot be inflated is reported as
/// [`CodecError::Fetch`]; a payload with the wrong shape as
/// [`CodecError::Format`].
pub fn decode_grid(compressed: &[u8], url: &str) -> Result<DecodedGrid> {
    let mut payload = Vec::with_capacity(compressed.len() * 4);
    GzDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(|e| CodecError::fetch(url, format!("gzip decompression failed: {}", e)))?;

    let grid = decode_payload(&payload)?;
    debug!(
        url = %url,
        width = grid.width(),
        height = grid.height(),
        "Decoded grid"
    );
    Ok(grid)
}

/// Decode an already-decompressed payload.
pub fn decode_payload(payload: &[u8]) -> Result<DecodedGrid> {
    if payload.len() < HEADER_LEN {
        return Err(CodecError::format(format!(
            "payload is {} bytes, shorter than the {}-byte header",
            payload.len(),
            HEADER_LEN
        )));
    }

    let height = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let width = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
    if height <= 0 || width <= 0 {
        return Err(CodecError::format(format!(
            "non-positive dimensions {}x{}",
            width, height
        )));
    }

    let (width, height) = (width as usize, height as usize);
    let expected = width
        .checked_mul(height)
        .and_then(|cells| cells.checked_mul(4))
        .and_then(|body| body.checked_add(HEADER_LEN))
        .ok_or_else(|| CodecError::format(format!("dimensions {}x{} overflow", width, height)))?;

    if payload.len() != expected {
        return Err(CodecError::format(format!(
            "expected {} bytes for {}x{} grid, got {}",
            expected,
            width,
            height,
            payload.len()
        )));
    }

    let values: Vec<f32> = payload[HEADER_LEN..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    DecodedGrid::new(width, height, values)
        .ok_or_else(|| CodecError::format("grid shape mismatch"))
}

/// Encode row-major values into the gzip-wrapped wire format.
pub fn encode_grid(width: usize, height: usize, values: &[f32]) -> Result<Vec<u8>> {
    if width == 0 || height == 0 || values.len() != width * height {
        return Err(CodecError::format(format!(
            "cannot encode {} values as {}x{}",
            values.len(),
            width,
            height
        )));
    }
    let (w, h) = match (i32::try_from(width), i32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(CodecError::format("dimensions exceed i32 range")),
    };

    let mut payload = Vec::with_capacity(HEADER_LEN + values.len() * 4);
    payload.extend_from_slice(&h.to_le_bytes());
    payload.extend_from_slice(&w.to_le_bytes());
    for v in values {
        payload.extend_from_slice(&v.to_le_bytes());
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&payload)
        .map_err(|e| CodecError::format(format!("gzip compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| CodecError::format(format!("gzip compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_payload(height: i32, width: i32, values: &[f32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_payload_layout() {
        // height=2, width=3: rows are [1,2,3] and [4,5,6]
        let payload = raw_payload(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let grid = decode_payload(&payload).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 2), Some(3.0));
        assert_eq!(grid.get(1, 0), Some(4.0));
    }

    #[test]
    fn test_decode_payload_wrong_length() {
        let mut payload = raw_payload(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        payload.push(0);
        assert!(matches!(decode_payload(&payload), Err(CodecError::Format(_))));

        let short = raw_payload(2, 2, &[1.0, 2.0, 3.0]);
        assert!(matches!(decode_payload(&short), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_decode_payload_non_positive_dims() {
        assert!(matches!(
            decode_payload(&raw_payload(0, 2, &[])),
            Err(CodecError::Format(_))
        ));
        assert!(matches!(
            decode_payload(&raw_payload(2, -1, &[])),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_decode_payload_truncated_header() {
        assert!(matches!(decode_payload(&[1, 0, 0]), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_decode_grid_not_gzip_is_fetch_error() {
        let err = decode_grid(b"definitely not gzip", "data/x.gz").unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn test_round_trip_preserves_nan_bits() {
        let values = [1.0, f32::NAN, 3.0, 4.0];
        let bytes = encode_grid(2, 2, &values).unwrap();
        let grid = decode_grid(&bytes, "mem").unwrap();
        for (a, b) in values.iter().zip(grid.values()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_encode_rejects_shape_mismatch() {
        assert!(encode_grid(3, 2, &[0.0; 5]).is_err());
    }
}
