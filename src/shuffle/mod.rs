// ---------------------------------------------------------------------------
// Packed-pixel channel shuffle: 3→3, 3→4, 4→3, 4→4.
//
// Architecture: #[rite] row kernels run N full vector chunks and finish the
// row with the exact scalar loop. #[arcane] plane wrappers walk the rows
// (honoring strides and vertical flip) under a single token.
// ---------------------------------------------------------------------------

use crate::ConvertError;
use crate::backend::Kernel;
use crate::layout::{Geometry, check_plane, row_bytes};

mod scalar;
use scalar::*;

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
use avx2::*;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "aarch64")]
use neon::*;


// ===========================================================================
// Channel maps
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    C3to3,
    C3to4,
    C4to3,
    C4to4,
}

/// Destination channel `c` takes source channel `idx[c]`.
///
/// Only the 4→4 shape reads `idx[3]`; 3→4 writes 255 into the fourth slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChannelMap {
    pub shape: Shape,
    pub idx: [u8; 4],
}

impl ChannelMap {
    pub(crate) const SWAP_RB_4: Self = Self::fixed(Shape::C4to4, [2, 1, 0, 3]);
    pub(crate) const SWAP_RB_3: Self = Self::fixed(Shape::C3to3, [2, 1, 0, 0]);
    pub(crate) const DROP_ALPHA: Self = Self::fixed(Shape::C4to3, [0, 1, 2, 0]);
    pub(crate) const DROP_ALPHA_SWAP_RB: Self = Self::fixed(Shape::C4to3, [2, 1, 0, 0]);
    pub(crate) const ADD_ALPHA: Self = Self::fixed(Shape::C3to4, [0, 1, 2, 0]);
    pub(crate) const ADD_ALPHA_SWAP_RB: Self = Self::fixed(Shape::C3to4, [2, 1, 0, 0]);

    const fn fixed(shape: Shape, idx: [u8; 4]) -> Self {
        Self { shape, idx }
    }

    /// Build a map from caller-supplied channel counts and indices.
    ///
    /// `map` holds one source index per destination color channel: four
    /// entries for 4→4, three for every other shape.
    pub(crate) fn new(
        src_channels: usize,
        dst_channels: usize,
        map: &[u8],
    ) -> Result<Self, ConvertError> {
        let shape = match (src_channels, dst_channels) {
            (3, 3) => Shape::C3to3,
            (3, 4) => Shape::C3to4,
            (4, 3) => Shape::C4to3,
            (4, 4) => Shape::C4to4,
            _ => return Err(ConvertError::InvalidArgument("channel counts must be 3 or 4")),
        };
        let entries = if shape == Shape::C4to4 { 4 } else { 3 };
        if map.len() != entries {
            return Err(ConvertError::InvalidArgument(
                "channel map length does not match shape",
            ));
        }
        if map.iter().any(|&i| usize::from(i) >= src_channels) {
            return Err(ConvertError::InvalidArgument("channel map index out of range"));
        }
        let mut idx = [0u8; 4];
        idx[..entries].copy_from_slice(map);
        Ok(Self { shape, idx })
    }

    pub(crate) const fn src_bpp(&self) -> usize {
        match self.shape {
            Shape::C3to3 | Shape::C3to4 => 3,
            Shape::C4to3 | Shape::C4to4 => 4,
        }
    }

    pub(crate) const fn dst_bpp(&self) -> usize {
        match self.shape {
            Shape::C3to3 | Shape::C4to3 => 3,
            Shape::C3to4 | Shape::C4to4 => 4,
        }
    }
}

// ===========================================================================
// Entry
// ===========================================================================

/// Validate then shuffle a whole plane with the resolved kernel.
#[allow(clippy::too_many_arguments)]
pub(crate) fn shuffle_plane(
    kernel: Kernel,
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: isize,
    map: &ChannelMap,
) -> Result<(), ConvertError> {
    let g = Geometry::new(width, height)?;
    check_plane(src.len(), row_bytes(width, map.src_bpp())?, g.rows, src_stride)?;
    check_plane(dst.len(), row_bytes(width, map.dst_bpp())?, g.rows, dst_stride)?;
    run_kernel(kernel, src, src_stride, dst, dst_stride, g, map);
    Ok(())
}

/// Dispatch an already validated plane.
fn run_kernel(
    kernel: Kernel,
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    g: Geometry,
    map: &ChannelMap,
) {
    match kernel {
        Kernel::Scalar(t) => shuffle_plane_scalar(t, src, src_stride, dst, dst_stride, g, map),
        #[cfg(target_arch = "x86_64")]
        Kernel::Avx2(t) => shuffle_plane_v3(t, src, src_stride, dst, dst_stride, g, map),
        #[cfg(target_arch = "aarch64")]
        Kernel::Neon(t) => shuffle_plane_neon(t, src, src_stride, dst, dst_stride, g, map),
    }
}
