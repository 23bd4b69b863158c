//! Stride, orientation and plane-size validation shared by both engines.
//!
//! Everything here runs before a kernel touches memory, so a rejected call
//! never writes to its destination.

use crate::ConvertError;

/// Validated frame geometry.
///
/// A negative height flips the output vertically: output row `rows - 1 - y`
/// receives input row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub width: usize,
    pub rows: usize,
    pub flip: bool,
}

impl Geometry {
    pub(crate) fn new(width: usize, height: isize) -> Result<Self, ConvertError> {
        if width == 0 {
            return Err(ConvertError::InvalidArgument("width is zero"));
        }
        if height == 0 {
            return Err(ConvertError::InvalidArgument("height is zero"));
        }
        Ok(Self {
            width,
            rows: height.unsigned_abs(),
            flip: height < 0,
        })
    }

    /// Destination row written for source row `y`.
    #[inline(always)]
    pub(crate) fn dst_row(&self, y: usize) -> usize {
        if self.flip { self.rows - 1 - y } else { y }
    }

    /// Chroma samples per row for 2:1 horizontal subsampling.
    #[inline]
    pub(crate) fn chroma_width(&self) -> usize {
        self.width.div_ceil(2)
    }

    /// Chroma rows for 2:1 vertical subsampling.
    #[inline]
    pub(crate) fn chroma_rows(&self) -> usize {
        self.rows.div_ceil(2)
    }
}

#[inline]
pub(crate) fn row_bytes(width: usize, bpp: usize) -> Result<usize, ConvertError> {
    width
        .checked_mul(bpp)
        .ok_or(ConvertError::InvalidArgument("row size overflows usize"))
}

/// Check that a plane of `rows` rows, each `row_bytes` long and `stride`
/// apart, fits in a slice of length `len`.
#[inline]
pub(crate) fn check_plane(
    len: usize,
    row_bytes: usize,
    rows: usize,
    stride: usize,
) -> Result<(), ConvertError> {
    if len == 0 {
        return Err(ConvertError::InvalidArgument("empty buffer"));
    }
    if row_bytes > stride {
        return Err(ConvertError::InvalidArgument("stride smaller than row size"));
    }
    let needed = rows
        .saturating_sub(1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(ConvertError::InvalidArgument("plane size overflows usize"))?;
    if len < needed {
        return Err(ConvertError::InvalidArgument(
            "buffer too short for declared geometry",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Geometry::new(0, 4).is_err());
        assert!(Geometry::new(4, 0).is_err());
    }

    #[test]
    fn negative_height_flips() {
        let g = Geometry::new(3, -4).unwrap();
        assert_eq!(g.rows, 4);
        assert!(g.flip);
        assert_eq!(g.dst_row(0), 3);
        assert_eq!(g.dst_row(3), 0);
        let g = Geometry::new(3, 4).unwrap();
        assert_eq!(g.dst_row(1), 1);
    }

    #[test]
    fn odd_chroma_dims_round_up() {
        let g = Geometry::new(5, -3).unwrap();
        assert_eq!(g.chroma_width(), 3);
        assert_eq!(g.chroma_rows(), 2);
    }

    #[test]
    fn last_row_needs_no_padding() {
        // 3 rows, stride 16, row 12: 16*2 + 12
        assert!(check_plane(44, 12, 3, 16).is_ok());
        assert!(check_plane(43, 12, 3, 16).is_err());
    }

    #[test]
    fn short_stride_rejected() {
        assert_eq!(
            check_plane(100, 12, 2, 11),
            Err(ConvertError::InvalidArgument("stride smaller than row size"))
        );
    }

    #[test]
    fn empty_rejected() {
        assert!(check_plane(0, 3, 1, 3).is_err());
    }

    #[test]
    fn overflow_rejected() {
        assert!(check_plane(usize::MAX, 8, usize::MAX, usize::MAX).is_err());
        assert!(row_bytes(usize::MAX, 3).is_err());
    }
}
