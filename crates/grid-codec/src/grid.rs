//! Decoded 2-D grid.

/// A dense row-major grid of `f32` values with NaN marking missing data.
///
/// Cells are addressed as `(y, x)`: row first, then column.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl DecodedGrid {
    /// Wrap row-major values. Returns `None` when the length does not match
    /// the dimensions or either dimension is zero.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || values.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Value at row `y`, column `x`; `None` outside the grid.
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> Option<f32> {
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(self.values[y * self.width + x])
    }

    /// One row of values.
    pub fn row(&self, y: usize) -> Option<&[f32]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.values[start..start + self.width])
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Minimum and maximum over non-NaN cells.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_addressing() {
        // 3 wide, 2 tall
        let grid = DecodedGrid::new(3, 2, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]).unwrap();
        assert_eq!(grid.get(0, 2), Some(2.0));
        assert_eq!(grid.get(1, 0), Some(10.0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.row(1), Some(&[10.0, 11.0, 12.0][..]));
    }

    #[test]
    fn test_rejects_bad_shape() {
        assert!(DecodedGrid::new(2, 2, vec![1.0; 3]).is_none());
        assert!(DecodedGrid::new(0, 2, vec![]).is_none());
    }

    #[test]
    fn test_value_range_skips_nan() {
        let grid = DecodedGrid::new(2, 2, vec![f32::NAN, 3.0, -1.0, 2.0]).unwrap();
        assert_eq!(grid.value_range(), Some((-1.0, 3.0)));

        let empty = DecodedGrid::new(1, 1, vec![f32::NAN]).unwrap();
        assert_eq!(empty.value_range(), None);
    }
}
