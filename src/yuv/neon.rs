use archmage::prelude::*;
use core::arch::aarch64::{
    int16x8_t, int32x4_t, uint8x8_t, uint8x16_t, uint8x16x2_t, uint8x16x3_t, uint8x16x4_t,
    vaddq_s32, vcombine_s16, vcombine_u8, vdupq_n_s16, vdupq_n_s32, vdupq_n_u8, vget_high_s16,
    vget_high_u8, vget_low_s16, vget_low_u8, vmlal_n_s16, vmlsl_n_s16, vmovl_u8, vmull_n_s16,
    vqmovn_s32, vqmovun_s16, vqtbl2q_u8, vreinterpretq_s16_u16, vshrq_n_s32, vsubq_s16,
    vzip1q_s32, vzip2q_s32,
};
use safe_unaligned_simd::aarch64::{vld1q_s32, vld1q_u8, vld2q_u8, vst1q_s32, vst3q_u8, vst4q_u8};

use super::scalar::yuv422_row;
use super::{Chroma, TermRows, Yuv420, Yuv422, terms_px};
use crate::PackedFormat;
use crate::color::Coefficients;
use crate::layout::Geometry;

/// Low and high four lanes of eight i32 values.
type Halves = (int32x4_t, int32x4_t);

// ===========================================================================
// ARM NEON: rite building blocks
// ===========================================================================

#[rite]
fn widen_s16_neon(_token: NeonToken, v: uint8x8_t, bias: int16x8_t) -> int16x8_t {
    vsubq_s16(vreinterpretq_s16_u16(vmovl_u8(v)), bias)
}

/// `(lo, hi) >> 8`, saturated to 0..=255.
#[rite]
fn narrow_neon(_token: NeonToken, lo: int32x4_t, hi: int32x4_t) -> uint8x8_t {
    vqmovun_s16(vcombine_s16(
        vqmovn_s32(vshrq_n_s32::<8>(lo)),
        vqmovn_s32(vshrq_n_s32::<8>(hi)),
    ))
}

/// Chroma terms (R, G, B) of 8 samples, rounding bias included.
#[rite]
fn chroma8_neon(
    t: NeonToken,
    u: uint8x8_t,
    v: uint8x8_t,
    c: &Coefficients,
) -> (Halves, Halves, Halves) {
    let bias = vdupq_n_s16(128);
    let d = widen_s16_neon(t, u, bias);
    let e = widen_s16_neon(t, v, bias);
    let (rv, gu, gv, bu) = (c.rv as i16, c.gu as i16, c.gv as i16, c.bu as i16);
    let (d_lo, d_hi) = (vget_low_s16(d), vget_high_s16(d));
    let (e_lo, e_hi) = (vget_low_s16(e), vget_high_s16(e));
    let round = vdupq_n_s32(128);
    let r = (vmlal_n_s16(round, e_lo, rv), vmlal_n_s16(round, e_hi, rv));
    let g = (
        vmlsl_n_s16(vmlsl_n_s16(round, d_lo, gu), e_lo, gv),
        vmlsl_n_s16(vmlsl_n_s16(round, d_hi, gu), e_hi, gv),
    );
    let b = (vmlal_n_s16(round, d_lo, bu), vmlal_n_s16(round, d_hi, bu));
    (r, g, b)
}

/// `cy * (Y - y_offset)` for 8 luma samples.
#[rite]
fn luma8_neon(t: NeonToken, y: uint8x8_t, c: &Coefficients) -> Halves {
    let l = widen_s16_neon(t, y, vdupq_n_s16(c.y_offset as i16));
    let cy = c.cy as i16;
    (
        vmull_n_s16(vget_low_s16(l), cy),
        vmull_n_s16(vget_high_s16(l), cy),
    )
}

#[rite]
fn channel8_neon(t: NeonToken, l: Halves, terms: Halves) -> uint8x8_t {
    narrow_neon(t, vaddq_s32(l.0, terms.0), vaddq_s32(l.1, terms.1))
}

/// 8 pixels from luma and chroma samples. Returns (R, G, B).
#[rite]
fn px8_neon(
    t: NeonToken,
    y: uint8x8_t,
    u: uint8x8_t,
    v: uint8x8_t,
    c: &Coefficients,
) -> (uint8x8_t, uint8x8_t, uint8x8_t) {
    let l = luma8_neon(t, y, c);
    let (r, g, b) = chroma8_neon(t, u, v, c);
    (
        channel8_neon(t, l, r),
        channel8_neon(t, l, g),
        channel8_neon(t, l, b),
    )
}

/// Interleave 16 pixels into the start of `dst` with `st3`/`st4`.
#[rite]
fn store16_neon(
    _token: NeonToken,
    r: uint8x16_t,
    g: uint8x16_t,
    b: uint8x16_t,
    dst: &mut [u8],
    f: PackedFormat,
) {
    let (c0, c2) = if f.is_bgr() { (b, r) } else { (r, b) };
    if f.has_alpha() {
        let out: &mut [u8; 64] = (&mut dst[..64]).try_into().unwrap();
        vst4q_u8(out, uint8x16x4_t(c0, g, c2, vdupq_n_u8(0xFF)));
    } else {
        let out: &mut [u8; 48] = (&mut dst[..48]).try_into().unwrap();
        vst3q_u8(out, uint8x16x3_t(c0, g, c2));
    }
}

/// Four cached terms, each repeated for the two pixels it covers.
#[rite]
fn spread4_neon(_token: NeonToken, s: &[i32]) -> Halves {
    let four: &[i32; 4] = s[..4].try_into().unwrap();
    let v = vld1q_s32(four);
    (vzip1q_s32(v, v), vzip2q_s32(v, v))
}

/// Store two `Halves` (16 values) at the start of `out`.
#[rite]
fn store16_i32_neon(_token: NeonToken, out: &mut [i32], lo: Halves, hi: Halves) {
    for (k, v) in [lo.0, lo.1, hi.0, hi.1].into_iter().enumerate() {
        let o: &mut [i32; 4] = (&mut out[k * 4..k * 4 + 4]).try_into().unwrap();
        vst1q_s32(o, v);
    }
}

#[rite]
fn store_terms16_neon(
    t: NeonToken,
    terms: &mut TermRows<'_>,
    i: usize,
    u: uint8x16_t,
    v: uint8x16_t,
    c: &Coefficients,
) {
    let lo = chroma8_neon(t, vget_low_u8(u), vget_low_u8(v), c);
    let hi = chroma8_neon(t, vget_high_u8(u), vget_high_u8(v), c);
    store16_i32_neon(t, &mut terms.r[i..], lo.0, hi.0);
    store16_i32_neon(t, &mut terms.g[i..], lo.1, hi.1);
    store16_i32_neon(t, &mut terms.b[i..], lo.2, hi.2);
}

// ===========================================================================
// ARM NEON: rite row implementations
// ===========================================================================

/// Terms of chroma row `cy`, 16 samples per iteration. Interleaved pairs
/// are split by `ld2`.
#[rite]
pub(super) fn chroma_terms_neon(
    t: NeonToken,
    p: &Yuv420<'_>,
    cy: usize,
    terms: &mut TermRows<'_>,
    c: &Coefficients,
) {
    let cw = terms.len();
    let mut i = 0;
    match p.chroma {
        Chroma::Pairs { uv, u } => {
            let row = uv.row(cy, cw * 2);
            while i + 16 <= cw {
                let pairs: &[u8; 32] = row[2 * i..2 * i + 32].try_into().unwrap();
                let split = vld2q_u8(pairs);
                let (us, vs) = if u == 0 {
                    (split.0, split.1)
                } else {
                    (split.1, split.0)
                };
                store_terms16_neon(t, terms, i, us, vs, c);
                i += 16;
            }
        }
        Chroma::Planes { u, v } => {
            let (ur, vr) = (u.row(cy, cw), v.row(cy, cw));
            while i + 16 <= cw {
                let us: &[u8; 16] = ur[i..i + 16].try_into().unwrap();
                let vs: &[u8; 16] = vr[i..i + 16].try_into().unwrap();
                store_terms16_neon(t, terms, i, vld1q_u8(us), vld1q_u8(vs), c);
                i += 16;
            }
        }
    }
    terms.fill_from(p, cy, i, c);
}

/// One luma row of a 4:2:0 frame against cached chroma terms, 16 px per
/// iteration.
#[rite]
pub(super) fn luma_row_neon(
    t: NeonToken,
    y: &[u8],
    terms: &TermRows<'_>,
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let bpp = f.bpp();
    let n = y.len().min(dst.len() / bpp);
    let mut x = 0;
    while x + 16 <= n {
        let ys: &[u8; 16] = y[x..x + 16].try_into().unwrap();
        let yq = vld1q_u8(ys);
        let (l0, l1) = (
            luma8_neon(t, vget_low_u8(yq), c),
            luma8_neon(t, vget_high_u8(yq), c),
        );
        let i = x / 2;
        let r = vcombine_u8(
            channel8_neon(t, l0, spread4_neon(t, &terms.r[i..])),
            channel8_neon(t, l1, spread4_neon(t, &terms.r[i + 4..])),
        );
        let g = vcombine_u8(
            channel8_neon(t, l0, spread4_neon(t, &terms.g[i..])),
            channel8_neon(t, l1, spread4_neon(t, &terms.g[i + 4..])),
        );
        let b = vcombine_u8(
            channel8_neon(t, l0, spread4_neon(t, &terms.b[i..])),
            channel8_neon(t, l1, spread4_neon(t, &terms.b[i + 4..])),
        );
        store16_neon(t, r, g, b, &mut dst[x * bpp..], f);
        x += 16;
    }
    terms_px(y, terms, x, dst, f, c);
}

/// One packed 4:2:2 row, 16 px (32 source bytes) per iteration. Y, U and V
/// are picked out of the macropixels with a two-register `tbl`.
#[rite]
pub(super) fn yuv422_row_neon(
    t: NeonToken,
    p: &Yuv422<'_>,
    row: &[u8],
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let [ty, tu, tv] = p.gather_tables();
    let (ty, tu, tv) = (vld1q_u8(&ty), vld1q_u8(&tu), vld1q_u8(&tv));
    let bpp = f.bpp();
    let n = (dst.len() / bpp).min(row.len() / 2);
    let mut x = 0;
    while x + 16 <= n {
        let a: &[u8; 16] = row[2 * x..2 * x + 16].try_into().unwrap();
        let b: &[u8; 16] = row[2 * x + 16..2 * x + 32].try_into().unwrap();
        let m = uint8x16x2_t(vld1q_u8(a), vld1q_u8(b));
        let (ys, us, vs) = (vqtbl2q_u8(m, ty), vqtbl2q_u8(m, tu), vqtbl2q_u8(m, tv));
        let (r0, g0, b0) = px8_neon(t, vget_low_u8(ys), vget_low_u8(us), vget_low_u8(vs), c);
        let (r1, g1, b1) = px8_neon(t, vget_high_u8(ys), vget_high_u8(us), vget_high_u8(vs), c);
        store16_neon(
            t,
            vcombine_u8(r0, r1),
            vcombine_u8(g0, g1),
            vcombine_u8(b0, b1),
            &mut dst[x * bpp..],
            f,
        );
        x += 16;
    }
    yuv422_row(&row[2 * x..], p, &mut dst[x * bpp..], f, c);
}

// ===========================================================================
// NEON arcane plane wrappers
// ===========================================================================

#[arcane]
pub(super) fn yuv420_plane_neon(
    t: NeonToken,
    p: &Yuv420<'_>,
    terms: &mut TermRows<'_>,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    f: PackedFormat,
    c: &Coefficients,
) {
    let db = g.width * f.bpp();
    for cy in 0..g.chroma_rows() {
        chroma_terms_neon(t, p, cy, terms, c);
        for y in 2 * cy..(2 * cy + 2).min(g.rows) {
            let dy = g.dst_row(y);
            luma_row_neon(t, p.luma_row(y, g.width), terms, &mut dst[dy * ds..][..db], f, c);
        }
    }
}

#[arcane]
pub(super) fn yuv422_plane_neon(
    t: NeonToken,
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
        yuv422_row_neon(t, p, p.row(y, g.width), &mut dst[dy * ds..][..db], f, c);
    }
}
