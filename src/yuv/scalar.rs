use archmage::prelude::*;

use super::{Source, Yuv420, Yuv422, store_px};
use crate::PackedFormat;
use crate::color::Coefficients;
use crate::layout::Geometry;

// ===========================================================================
// Scalar reference kernels
// ===========================================================================

/// One luma row of a 4:2:0 frame. Chroma sample `i` (every `step` bytes)
/// covers luma columns `2i` and `2i + 1`.
#[inline(always)]
fn yuv420_row(
    y: &[u8],
    u: &[u8],
    v: &[u8],
    step: usize,
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let bpp = f.bpp();
    for (i, (ys, d)) in y.chunks(2).zip(dst.chunks_mut(2 * bpp)).enumerate() {
        let t = c.chroma(u[i * step], v[i * step]);
        for (&l, px) in ys.iter().zip(d.chunks_exact_mut(bpp)) {
            store_px(px, c.apply(l, t), f);
        }
    }
}

/// One packed 4:2:2 row. The final macropixel of an odd-width row
/// contributes only its first luma sample.
#[inline(always)]
pub(super) fn yuv422_row(
    row: &[u8],
    p: &Yuv422<'_>,
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let bpp = f.bpp();
    for (m, d) in row.chunks_exact(4).zip(dst.chunks_mut(2 * bpp)) {
        let t = c.chroma(m[p.u], m[p.v]);
        let luma = [m[p.y0], m[p.y0 + 2]];
        for (&l, px) in luma.iter().zip(d.chunks_exact_mut(bpp)) {
            store_px(px, c.apply(l, t), f);
        }
    }
}

fn yuv420_plane(
    p: &Yuv420<'_>,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    f: PackedFormat,
    c: &Coefficients,
) {
    let db = g.width * f.bpp();
    for y in 0..g.rows {
        let (u, v, step) = p.chroma_rows(y / 2);
        let dy = g.dst_row(y);
        yuv420_row(p.luma_row(y, g.width), u, v, step, &mut dst[dy * ds..][..db], f, c);
    }
}

fn yuv422_plane(
    p: &Yuv422<'_>,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    f: PackedFormat,
    c: &Coefficients,
) {
    let db = g.width * f.bpp();
    for y in 0..g.rows {
        let dy = g.dst_row(y);
        yuv422_row(p.row(y, g.width), p, &mut dst[dy * ds..][..db], f, c);
    }
}

pub(super) fn yuv_plane_scalar(
    _token: ScalarToken,
    src: &Source<'_>,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    f: PackedFormat,
    c: &Coefficients,
) {
    match src {
        Source::Planar420(p) => yuv420_plane(p, dst, ds, g, f, c),
        Source::Packed422(p) => yuv422_plane(p, dst, ds, g, f, c),
    }
}
