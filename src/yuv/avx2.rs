use archmage::prelude::*;
use core::arch::x86_64::{__m128i, __m256i};
use safe_unaligned_simd::x86_64::{_mm_loadu_si128, _mm256_loadu_si256, _mm256_storeu_si256};

use super::scalar::yuv422_row;
use super::{Chroma, TermRows, Yuv420, Yuv422, gather_table, terms_px};
use crate::PackedFormat;
use crate::color::Coefficients;
use crate::layout::Geometry;

// ===========================================================================
// SIMD constants
// ===========================================================================

// Keep bytes 0,1,2 of each dword (4 pixels → 12 bytes per lane).
const DROP_ALPHA_SHUF_AVX: [i8; 32] = [
    0, 1, 2, 4, 5, 6, 8, 9, 10, 12, 13, 14, -128, -128, -128, -128, 0, 1, 2, 4, 5, 6, 8, 9, 10, 12,
    13, 14, -128, -128, -128, -128,
];

const PACK_3X4_PERM_AVX: [i8; 32] = [
    0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

// Even and odd bytes of 8 interleaved pairs.
const EVEN_BYTES_SSE: [u8; 16] = gather_table(0, 2, 1);
const ODD_BYTES_SSE: [u8; 16] = gather_table(1, 2, 1);

// ===========================================================================
// x86-64 AVX2: rite building blocks
// ===========================================================================

/// Zero-extend 8 bytes to 8 × i32.
#[rite]
fn widen8_v3(_token: X64V3Token, s: &[u8]) -> __m256i {
    let bytes = u64::from_ne_bytes(s[..8].try_into().unwrap());
    _mm256_cvtepu8_epi32(_mm_set_epi64x(0, bytes as i64))
}

/// `pshufb` the low 8 lanes of `src` through `table`, then zero-extend them.
#[rite]
fn gather8_v3(_token: X64V3Token, src: __m128i, table: __m128i) -> __m256i {
    _mm256_cvtepu8_epi32(_mm_shuffle_epi8(src, table))
}

/// Chroma terms (R, G, B) of 8 samples, rounding bias included.
#[rite]
fn chroma8_v3(
    _token: X64V3Token,
    u: __m256i,
    v: __m256i,
    c: &Coefficients,
) -> (__m256i, __m256i, __m256i) {
    let k128 = _mm256_set1_epi32(128);
    let d = _mm256_sub_epi32(u, k128);
    let e = _mm256_sub_epi32(v, k128);
    let r = _mm256_add_epi32(_mm256_mullo_epi32(e, _mm256_set1_epi32(c.rv)), k128);
    let g = _mm256_sub_epi32(
        _mm256_sub_epi32(k128, _mm256_mullo_epi32(d, _mm256_set1_epi32(c.gu))),
        _mm256_mullo_epi32(e, _mm256_set1_epi32(c.gv)),
    );
    let b = _mm256_add_epi32(_mm256_mullo_epi32(d, _mm256_set1_epi32(c.bu)), k128);
    (r, g, b)
}

/// `cy * (Y - y_offset)` for 8 widened luma samples.
#[rite]
fn luma8_v3(_token: X64V3Token, y: __m256i, c: &Coefficients) -> __m256i {
    let l = _mm256_sub_epi32(y, _mm256_set1_epi32(c.y_offset));
    _mm256_mullo_epi32(l, _mm256_set1_epi32(c.cy))
}

/// `v >> 8` clamped to 0..=255.
#[rite]
fn clamp_q8_v3(_token: X64V3Token, v: __m256i) -> __m256i {
    let v = _mm256_max_epi32(_mm256_srai_epi32::<8>(v), _mm256_setzero_si256());
    _mm256_min_epi32(v, _mm256_set1_epi32(255))
}

/// Luma plus chroma terms, clamped and packed as one dword per pixel with
/// alpha 0xFF.
#[rite]
fn pack8_v3(
    t: X64V3Token,
    l: __m256i,
    terms: (__m256i, __m256i, __m256i),
    bgr: bool,
) -> __m256i {
    let r = clamp_q8_v3(t, _mm256_add_epi32(l, terms.0));
    let g = clamp_q8_v3(t, _mm256_add_epi32(l, terms.1));
    let b = clamp_q8_v3(t, _mm256_add_epi32(l, terms.2));
    let (c0, c2) = if bgr { (b, r) } else { (r, b) };
    let alpha = _mm256_set1_epi32(0xFF00_0000_u32 as i32);
    _mm256_or_si256(
        _mm256_or_si256(c0, _mm256_slli_epi32::<8>(g)),
        _mm256_or_si256(_mm256_slli_epi32::<16>(c2), alpha),
    )
}

/// Store 8 packed pixels at the start of `dst`: 32 bytes for 4 bpp, 24 for 3.
#[rite]
fn store8_v3(_token: X64V3Token, px: __m256i, dst: &mut [u8], bpp: usize) {
    if bpp == 4 {
        let out: &mut [u8; 32] = (&mut dst[..32]).try_into().unwrap();
        _mm256_storeu_si256(out, px);
    } else {
        let shuf = _mm256_loadu_si256(&DROP_ALPHA_SHUF_AVX);
        let pack = _mm256_loadu_si256(&PACK_3X4_PERM_AVX);
        let packed = _mm256_permutevar8x32_epi32(_mm256_shuffle_epi8(px, shuf), pack);
        let mut tmp = [0u8; 32];
        _mm256_storeu_si256(&mut tmp, packed);
        dst[..24].copy_from_slice(&tmp[..24]);
    }
}

/// Four cached terms, each repeated for the two pixels it covers.
#[rite]
fn spread4_v3(_token: X64V3Token, s: &[i32]) -> __m256i {
    let four: &[i32; 4] = s[..4].try_into().unwrap();
    let dup = _mm256_setr_epi32(0, 0, 1, 1, 2, 2, 3, 3);
    _mm256_permutevar8x32_epi32(_mm256_castsi128_si256(_mm_loadu_si128(four)), dup)
}

#[rite]
fn store_terms8_v3(
    _token: X64V3Token,
    terms: &mut TermRows<'_>,
    i: usize,
    values: (__m256i, __m256i, __m256i),
) {
    let r: &mut [i32; 8] = (&mut terms.r[i..i + 8]).try_into().unwrap();
    _mm256_storeu_si256(r, values.0);
    let g: &mut [i32; 8] = (&mut terms.g[i..i + 8]).try_into().unwrap();
    _mm256_storeu_si256(g, values.1);
    let b: &mut [i32; 8] = (&mut terms.b[i..i + 8]).try_into().unwrap();
    _mm256_storeu_si256(b, values.2);
}

// ===========================================================================
// x86-64 AVX2: rite row implementations
// ===========================================================================

/// Terms of chroma row `cy`, 8 samples per iteration. Interleaved pairs are
/// split with `pshufb`.
#[rite]
pub(super) fn chroma_terms_v3(
    t: X64V3Token,
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
            let (even, odd) = (
                _mm_loadu_si128(&EVEN_BYTES_SSE),
                _mm_loadu_si128(&ODD_BYTES_SSE),
            );
            let (us, vs) = if u == 0 { (even, odd) } else { (odd, even) };
            while i + 8 <= cw {
                let pairs: &[u8; 16] = row[2 * i..2 * i + 16].try_into().unwrap();
                let q = _mm_loadu_si128(pairs);
                let values = chroma8_v3(t, gather8_v3(t, q, us), gather8_v3(t, q, vs), c);
                store_terms8_v3(t, terms, i, values);
                i += 8;
            }
        }
        Chroma::Planes { u, v } => {
            let (ur, vr) = (u.row(cy, cw), v.row(cy, cw));
            while i + 8 <= cw {
                let values = chroma8_v3(t, widen8_v3(t, &ur[i..]), widen8_v3(t, &vr[i..]), c);
                store_terms8_v3(t, terms, i, values);
                i += 8;
            }
        }
    }
    terms.fill_from(p, cy, i, c);
}

/// One luma row of a 4:2:0 frame against cached chroma terms, 8 px per
/// iteration.
#[rite]
pub(super) fn luma_row_v3(
    t: X64V3Token,
    y: &[u8],
    terms: &TermRows<'_>,
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let (bpp, bgr) = (f.bpp(), f.is_bgr());
    let n = y.len().min(dst.len() / bpp);
    let mut x = 0;
    while x + 8 <= n {
        let l = luma8_v3(t, widen8_v3(t, &y[x..]), c);
        let i = x / 2;
        let cached = (
            spread4_v3(t, &terms.r[i..]),
            spread4_v3(t, &terms.g[i..]),
            spread4_v3(t, &terms.b[i..]),
        );
        store8_v3(t, pack8_v3(t, l, cached, bgr), &mut dst[x * bpp..], bpp);
        x += 8;
    }
    terms_px(y, terms, x, dst, f, c);
}

/// One packed 4:2:2 row, 8 px (16 source bytes) per iteration.
#[rite]
pub(super) fn yuv422_row_v3(
    t: X64V3Token,
    p: &Yuv422<'_>,
    row: &[u8],
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let [ty, tu, tv] = p.gather_tables();
    let (ty, tu, tv) = (
        _mm_loadu_si128(&ty),
        _mm_loadu_si128(&tu),
        _mm_loadu_si128(&tv),
    );
    let (bpp, bgr) = (f.bpp(), f.is_bgr());
    let n = (dst.len() / bpp).min(row.len() / 2);
    let mut x = 0;
    while x + 8 <= n {
        let m: &[u8; 16] = row[2 * x..2 * x + 16].try_into().unwrap();
        let q = _mm_loadu_si128(m);
        let l = luma8_v3(t, gather8_v3(t, q, ty), c);
        let terms = chroma8_v3(t, gather8_v3(t, q, tu), gather8_v3(t, q, tv), c);
        store8_v3(t, pack8_v3(t, l, terms, bgr), &mut dst[x * bpp..], bpp);
        x += 8;
    }
    yuv422_row(&row[2 * x..], p, &mut dst[x * bpp..], f, c);
}

// ===========================================================================
// x86-64 arcane plane wrappers
// ===========================================================================

#[arcane]
pub(super) fn yuv420_plane_v3(
    t: X64V3Token,
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
        chroma_terms_v3(t, p, cy, terms, c);
        for y in 2 * cy..(2 * cy + 2).min(g.rows) {
            let dy = g.dst_row(y);
            luma_row_v3(t, p.luma_row(y, g.width), terms, &mut dst[dy * ds..][..db], f, c);
        }
    }
}

#[arcane]
pub(super) fn yuv422_plane_v3(
    t: X64V3Token,
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
        yuv422_row_v3(t, p, p.row(y, g.width), &mut dst[dy * ds..][..db], f, c);
    }
}
