use archmage::prelude::*;
use core::arch::aarch64::{vorrq_u8, vqtbl1q_u8};
use safe_unaligned_simd::aarch64::{vld1q_u8, vst1q_u8};

use super::scalar::shuffle_px;
use super::{ChannelMap, Shape};
use crate::layout::Geometry;

const ALPHA_FF: [u8; 16] = [0, 0, 0, 0xFF, 0, 0, 0, 0xFF, 0, 0, 0, 0xFF, 0, 0, 0, 0xFF];

/// `tbl` control for one 16-byte block. Index 0x80 yields zero.
fn table(m: &ChannelMap) -> [u8; 16] {
    let idx = m.idx;
    let mut t = [0x80u8; 16];
    match m.shape {
        Shape::C4to4 => {
            for px in 0..4 {
                for c in 0..4 {
                    t[px * 4 + c] = (px * 4) as u8 + idx[c];
                }
            }
        }
        Shape::C3to4 => {
            for px in 0..4 {
                for c in 0..3 {
                    t[px * 4 + c] = (px * 3) as u8 + idx[c];
                }
            }
        }
        Shape::C4to3 => {
            for px in 0..4 {
                for c in 0..3 {
                    t[px * 3 + c] = (px * 4) as u8 + idx[c];
                }
            }
        }
        Shape::C3to3 => {
            for px in 0..5 {
                for c in 0..3 {
                    t[px * 3 + c] = (px * 3) as u8 + idx[c];
                }
            }
        }
    }
    t
}

// ===========================================================================
// ARM NEON: rite row implementations
// ===========================================================================

#[rite]
pub(super) fn shuffle_row_neon(
    _token: NeonToken,
    src: &[u8],
    dst: &mut [u8],
    m: &ChannelMap,
    tbl: &[u8; 16],
) {
    let shuf = vld1q_u8(tbl);
    let alpha = vld1q_u8(&ALPHA_FF);
    // Every iteration loads 16 source bytes; these are the bytes consumed
    // and the bytes written.
    let (src_step, dst_step) = match m.shape {
        Shape::C4to4 => (16, 16),
        Shape::C3to4 => (12, 16),
        Shape::C4to3 => (16, 12),
        Shape::C3to3 => (15, 15),
    };
    let (slen, dlen) = (src.len(), dst.len());
    let (mut is, mut id) = (0, 0);
    while is + 16 <= slen && id + dst_step <= dlen {
        let s: &[u8; 16] = src[is..is + 16].try_into().unwrap();
        let mut v = vqtbl1q_u8(vld1q_u8(s), shuf);
        if m.shape == Shape::C3to4 {
            v = vorrq_u8(v, alpha);
        }
        if dst_step == 16 {
            let d: &mut [u8; 16] = (&mut dst[id..id + 16]).try_into().unwrap();
            vst1q_u8(d, v);
        } else {
            let mut tmp = [0u8; 16];
            vst1q_u8(&mut tmp, v);
            dst[id..id + dst_step].copy_from_slice(&tmp[..dst_step]);
        }
        is += src_step;
        id += dst_step;
    }
    shuffle_px(&src[is..], &mut dst[id..], m);
}

// ===========================================================================
// NEON arcane plane wrapper
// ===========================================================================

#[arcane]
pub(super) fn shuffle_plane_neon(
    t: NeonToken,
    src: &[u8],
    ss: usize,
    dst: &mut [u8],
    ds: usize,
    g: Geometry,
    m: &ChannelMap,
) {
    let tbl = table(m);
    let (sb, db) = (g.width * m.src_bpp(), g.width * m.dst_bpp());
    for y in 0..g.rows {
        let dy = g.dst_row(y);
        shuffle_row_neon(t, &src[y * ss..][..sb], &mut dst[dy * ds..][..db], m, &tbl);
    }
}
