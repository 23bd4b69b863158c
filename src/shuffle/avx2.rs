use archmage::prelude::*;
use safe_unaligned_simd::x86_64::{
    _mm_loadu_si128, _mm_storeu_si128, _mm256_loadu_si256, _mm256_storeu_si256,
};

use super::scalar::shuffle_px;
use super::{ChannelMap, Shape};
use crate::layout::Geometry;

// ===========================================================================
// SIMD constants
// ===========================================================================

const ALPHA_FF_MASK_AVX: [i8; 32] = [
    0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0,
    0, 0, -1,
];

// Spread 24 packed bytes so each 128-bit lane holds 12 (dwords 0-3 | 3-6).
const RGB_ALIGN_PERM_AVX: [i8; 32] = [
    0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0,
];

// Merge 12 bytes from each 16-byte lane into contiguous 24 bytes.
const PACK_3X4_PERM_AVX: [i8; 32] = [
    0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Per-call `pshufb` controls derived from a [`ChannelMap`].
pub(super) struct ShuffleMasks {
    wide: [i8; 32],
    narrow: [i8; 16],
}

impl ShuffleMasks {
    pub(super) fn new(m: &ChannelMap) -> Self {
        let idx = m.idx.map(|c| c as i8);
        let mut wide = [-128i8; 32];
        let mut narrow = [-128i8; 16];
        match m.shape {
            Shape::C4to4 => {
                for px in 0..8 {
                    let base = ((px % 4) * 4) as i8;
                    for c in 0..4 {
                        wide[px * 4 + c] = base + idx[c];
                    }
                }
            }
            Shape::C3to4 => {
                for px in 0..8 {
                    let base = ((px % 4) * 3) as i8;
                    for c in 0..3 {
                        wide[px * 4 + c] = base + idx[c];
                    }
                }
            }
            Shape::C4to3 => {
                for lane in 0..2 {
                    for px in 0..4 {
                        for c in 0..3 {
                            wide[lane * 16 + px * 3 + c] = (px * 4) as i8 + idx[c];
                        }
                    }
                }
            }
            Shape::C3to3 => {
                for px in 0..5 {
                    for c in 0..3 {
                        narrow[px * 3 + c] = (px * 3) as i8 + idx[c];
                    }
                }
            }
        }
        Self { wide, narrow }
    }
}

// ===========================================================================
// x86-64 AVX2: rite row implementations
//
// Each chunk loop returns (src_offset, dst_offset) of the first pixel it did
// not handle. No load or store ever extends past either row.
// ===========================================================================

// 4→4: 8 px per iteration.
#[rite]
fn quad_chunks_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    k: &ShuffleMasks,
) -> (usize, usize) {
    let shuf = _mm256_loadu_si256(&k.wide);
    let n = src.len().min(dst.len());
    let mut i = 0;
    while i + 32 <= n {
        let s: &[u8; 32] = src[i..i + 32].try_into().unwrap();
        let v = _mm256_shuffle_epi8(_mm256_loadu_si256(s), shuf);
        let d: &mut [u8; 32] = (&mut dst[i..i + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, v);
        i += 32;
    }
    (i, i)
}

// 3→4: 8 px per iteration. The 32-byte load uses 24 bytes, so it is only
// issued while 32 source bytes remain.
#[rite]
fn expand_chunks_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    k: &ShuffleMasks,
) -> (usize, usize) {
    let perm = _mm256_loadu_si256(&RGB_ALIGN_PERM_AVX);
    let shuf = _mm256_loadu_si256(&k.wide);
    let alpha = _mm256_loadu_si256(&ALPHA_FF_MASK_AVX);
    let (slen, dlen) = (src.len(), dst.len());
    let (mut is, mut id) = (0, 0);
    while is + 32 <= slen && id + 32 <= dlen {
        let s: &[u8; 32] = src[is..is + 32].try_into().unwrap();
        let aligned = _mm256_permutevar8x32_epi32(_mm256_loadu_si256(s), perm);
        let px = _mm256_or_si256(_mm256_shuffle_epi8(aligned, shuf), alpha);
        let d: &mut [u8; 32] = (&mut dst[id..id + 32]).try_into().unwrap();
        _mm256_storeu_si256(d, px);
        is += 24;
        id += 32;
    }
    (is, id)
}

// 4→3: 8 px per iteration, 24 bytes written through a stack temporary.
#[rite]
fn strip_chunks_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    k: &ShuffleMasks,
) -> (usize, usize) {
    let shuf = _mm256_loadu_si256(&k.wide);
    let pack = _mm256_loadu_si256(&PACK_3X4_PERM_AVX);
    let (slen, dlen) = (src.len(), dst.len());
    let (mut is, mut id) = (0, 0);
    while is + 32 <= slen && id + 24 <= dlen {
        let s: &[u8; 32] = src[is..is + 32].try_into().unwrap();
        let stripped = _mm256_shuffle_epi8(_mm256_loadu_si256(s), shuf);
        let packed = _mm256_permutevar8x32_epi32(stripped, pack);
        let mut tmp = [0u8; 32];
        _mm256_storeu_si256(&mut tmp, packed);
        dst[id..id + 24].copy_from_slice(&tmp[..24]);
        is += 32;
        id += 24;
    }
    (is, id)
}

// 3→3: 5 px per iteration. 16-byte load, 15 bytes used and written.
#[rite]
fn tri_chunks_v3(
    _token: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    k: &ShuffleMasks,
) -> (usize, usize) {
    let shuf = _mm_loadu_si128(&k.narrow);
    let (slen, dlen) = (src.len(), dst.len());
    let mut i = 0;
    while i + 16 <= slen && i + 15 <= dlen {
        let s: &[u8; 16] = src[i..i + 16].try_into().unwrap();
        let v = _mm_shuffle_epi8(_mm_loadu_si128(s), shuf);
        let mut tmp = [0u8; 16];
        _mm_storeu_si128(&mut tmp, v);
        dst[i..i + 15].copy_from_slice(&tmp[..15]);
        i += 15;
    }
    (i, i)
}

#[rite]
pub(super) fn shuffle_row_v3(
    t: X64V3Token,
    src: &[u8],
    dst: &mut [u8],
    m: &ChannelMap,
    k: &ShuffleMasks,
) {
    let (is, id) = match m.shape {
        Shape::C4to4 => quad_chunks_v3(t, src, dst, k),
        Shape::C3to4 => expand_chunks_v3(t, src, dst, k),
        Shape::C4to3 => strip_chunks_v3(t, src, dst, k),
        Shape::C3to3 => tri_chunks_v3(t, src, dst, k),
    };
    shuffle_px(&src[is..], &mut dst[id..], m);
}

// ===========================================================================
// x86-64 arcane plane wrapper
// ===========================================================================

#[arcane]
pub(super) fn shuffle_plane_v3(
    t: X64V3Token,
    src: &[u8],
    ss: usize,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    m: &ChannelMap,
) {
    let k = ShuffleMasks::new(m);
    let (sb, db) = (g.width * m.src_bpp(), g.width * m.dst_bpp());
    for y in 0..g.rows {
        let dy = g.dst_row(y);
        shuffle_row_v3(t, &src[y * ss..][..sb], &mut dst[dy * ds..][..db], m, &k);
    }
}
