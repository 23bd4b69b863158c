use archmage::prelude::*;

use super::{ChannelMap, Shape};
use crate::layout::Geometry;

// ===========================================================================
// Scalar reference loop, also used for vector-kernel tails
// ===========================================================================

#[inline(always)]
pub(super) fn shuffle_px(src: &[u8], dst: &mut [u8], m: &ChannelMap) {
    let [i0, i1, i2, i3] = m.idx.map(usize::from);
    match m.shape {
        Shape::C3to3 => {
            for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
                d[0] = s[i0];
                d[1] = s[i1];
                d[2] = s[i2];
            }
        }
        Shape::C3to4 => {
            for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
                d[0] = s[i0];
                d[1] = s[i1];
                d[2] = s[i2];
                d[3] = 0xFF;
            }
        }
        Shape::C4to3 => {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                d[0] = s[i0];
                d[1] = s[i1];
                d[2] = s[i2];
            }
        }
        Shape::C4to4 => {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                d[0] = s[i0];
                d[1] = s[i1];
                d[2] = s[i2];
                d[3] = s[i3];
            }
        }
    }
}

pub(super) fn shuffle_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8], m: &ChannelMap) {
    shuffle_px(src, dst, m);
}

pub(super) fn shuffle_plane_scalar(
    t: ScalarToken,
    src: &[u8],
    ss: usize,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    m: &ChannelMap,
) {
    let (sb, db) = (g.width * m.src_bpp(), g.width * m.dst_bpp());
    for y in 0..g.rows {
        let dy = g.dst_row(y);
        shuffle_row_scalar(t, &src[y * ss..][..sb], &mut dst[dy * ds..][..db], m);
    }
}
