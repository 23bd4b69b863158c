// ---------------------------------------------------------------------------
// YUV → packed RGB plane conversion.
//
// The scalar kernel walks the source in its native layout and applies the
// chroma terms of each (U, V) sample to every luma sample that shares it.
// Vector kernels load luma and chroma straight from the source rows and
// deinterleave or duplicate samples in registers. For 4:2:0 sources they
// compute the terms of one chroma row into allocator scratch and reuse them
// for both luma rows. Scratch allocation failure drops that call to the
// scalar kernel. All kernels share the exact Q8 arithmetic of `color`.
// ---------------------------------------------------------------------------

use archmage::ScalarToken;
use bytemuck::cast_slice_mut;

use crate::aligned::{AlignedAllocator, AlignedBuf};
use crate::backend::Kernel;
use crate::color::{ChromaTerms, ColorSpace, Coefficients};
use crate::layout::{Geometry, check_plane, row_bytes};
use crate::{ConvertError, PackedFormat};

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


/// Maximum per-channel difference between the platform-accelerated (NEON)
/// backend and the CPU kernel. The AVX2 backend is byte-exact.
pub const ACCELERATED_TOLERANCE: u8 = 2;

// ===========================================================================
// Source descriptors
// ===========================================================================

/// One image plane: its bytes and the distance between row starts.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

impl<'a> Plane<'a> {
    pub const fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    #[inline(always)]
    fn row(&self, y: usize, len: usize) -> &'a [u8] {
        &self.data[y * self.stride..][..len]
    }
}

/// A YUV frame to convert.
///
/// 4:2:0 layouts carry `ceil(w/2) × ceil(h/2)` chroma samples per channel;
/// packed 4:2:2 layouts carry `ceil(w/2)` four-byte macropixels per row.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum YuvSource<'a> {
    /// Luma plane plus one interleaved U,V plane.
    Nv12 { y: Plane<'a>, uv: Plane<'a> },
    /// Luma plane plus one interleaved V,U plane.
    Nv21 { y: Plane<'a>, vu: Plane<'a> },
    /// Luma plane plus separate U and V planes.
    I420 {
        y: Plane<'a>,
        u: Plane<'a>,
        v: Plane<'a>,
    },
    /// Packed Y0 U Y1 V.
    Yuyv(Plane<'a>),
    /// Packed U Y0 V Y1.
    Uyvy(Plane<'a>),
}

/// 4:2:0 source: a full-resolution luma plane plus chroma at half
/// resolution in both directions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Yuv420<'a> {
    y: Plane<'a>,
    chroma: Chroma<'a>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Chroma<'a> {
    /// One plane of byte pairs with U at offset `u` (0 or 1) of each pair.
    Pairs { uv: Plane<'a>, u: usize },
    Planes { u: Plane<'a>, v: Plane<'a> },
}

/// Packed 4:2:2 source: byte offsets of Y0, U and V inside a macropixel.
/// Y1 always sits two bytes after Y0.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Yuv422<'a> {
    data: Plane<'a>,
    y0: usize,
    u: usize,
    v: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    Planar420(Yuv420<'a>),
    Packed422(Yuv422<'a>),
}

impl<'a> Source<'a> {
    /// Check every plane against the geometry.
    fn validate(src: &YuvSource<'a>, g: &Geometry) -> Result<Self, ConvertError> {
        let (cw, ch) = (g.chroma_width(), g.chroma_rows());
        let luma = |p: &Plane<'_>| check_plane(p.data.len(), g.width, g.rows, p.stride);
        let chroma = |p: &Plane<'_>, bpp: usize| {
            check_plane(p.data.len(), row_bytes(cw, bpp)?, ch, p.stride)
        };
        Ok(match *src {
            YuvSource::Nv12 { y, uv } => {
                luma(&y)?;
                chroma(&uv, 2)?;
                Self::Planar420(Yuv420 {
                    y,
                    chroma: Chroma::Pairs { uv, u: 0 },
                })
            }
            YuvSource::Nv21 { y, vu } => {
                luma(&y)?;
                chroma(&vu, 2)?;
                Self::Planar420(Yuv420 {
                    y,
                    chroma: Chroma::Pairs { uv: vu, u: 1 },
                })
            }
            YuvSource::I420 { y, u, v } => {
                luma(&y)?;
                chroma(&u, 1)?;
                chroma(&v, 1)?;
                Self::Planar420(Yuv420 {
                    y,
                    chroma: Chroma::Planes { u, v },
                })
            }
            YuvSource::Yuyv(p) => {
                check_plane(p.data.len(), row_bytes(cw, 4)?, g.rows, p.stride)?;
                Self::Packed422(Yuv422 {
                    data: p,
                    y0: 0,
                    u: 1,
                    v: 3,
                })
            }
            YuvSource::Uyvy(p) => {
                check_plane(p.data.len(), row_bytes(cw, 4)?, g.rows, p.stride)?;
                Self::Packed422(Yuv422 {
                    data: p,
                    y0: 1,
                    u: 0,
                    v: 2,
                })
            }
        })
    }
}

impl<'a> Yuv420<'a> {
    #[inline(always)]
    fn luma_row(&self, y: usize, width: usize) -> &'a [u8] {
        self.y.row(y, width)
    }

    /// U and V of chroma row `cy`, each starting at its first sample, and
    /// the byte step between samples.
    #[inline(always)]
    fn chroma_rows(&self, cy: usize) -> (&'a [u8], &'a [u8], usize) {
        match self.chroma {
            Chroma::Pairs { uv, u } => {
                let row = &uv.data[cy * uv.stride..];
                (&row[u..], &row[1 - u..], 2)
            }
            Chroma::Planes { u, v } => (&u.data[cy * u.stride..], &v.data[cy * v.stride..], 1),
        }
    }
}

impl<'a> Yuv422<'a> {
    #[inline(always)]
    fn row(&self, y: usize, width: usize) -> &'a [u8] {
        self.data.row(y, width.div_ceil(2) * 4)
    }

    /// Byte-gather tables for Y, U and V over a run of macropixels.
    fn gather_tables(&self) -> [[u8; 16]; 3] {
        [
            gather_table(self.y0, 2, 1),
            gather_table(self.u, 4, 2),
            gather_table(self.v, 4, 2),
        ]
    }
}

/// Byte-gather table: lane `k` reads source byte `first + step * (k / dup)`.
/// Lanes past the end of a 16- or 32-byte table source read as zero on NEON
/// and are ignored by the x86 kernels.
pub(crate) const fn gather_table(first: usize, step: usize, dup: usize) -> [u8; 16] {
    let mut t = [0u8; 16];
    let mut k = 0;
    while k < 16 {
        t[k] = (first + step * (k / dup)) as u8;
        k += 1;
    }
    t
}

// ===========================================================================
// Chroma term rows
// ===========================================================================

/// Bytes of scratch per chroma sample: one `i32` term per channel.
const TERM_BYTES: usize = 3 * core::mem::size_of::<i32>();

/// Chroma terms of one 4:2:0 chroma row, computed once and read by both
/// luma rows that share it.
#[derive(Debug)]
pub(crate) struct TermRows<'s> {
    r: &'s mut [i32],
    g: &'s mut [i32],
    b: &'s mut [i32],
}

impl<'s> TermRows<'s> {
    /// Carve `3 * cw` terms out of scratch.
    fn split(buf: &'s mut [i32], cw: usize) -> Self {
        let (r, rest) = buf.split_at_mut(cw);
        let (g, rest) = rest.split_at_mut(cw);
        Self {
            r,
            g,
            b: &mut rest[..cw],
        }
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.r.len()
    }

    #[inline(always)]
    fn at(&self, i: usize) -> ChromaTerms {
        ChromaTerms {
            r: self.r[i],
            g: self.g[i],
            b: self.b[i],
        }
    }

    #[inline(always)]
    fn set(&mut self, i: usize, t: ChromaTerms) {
        self.r[i] = t.r;
        self.g[i] = t.g;
        self.b[i] = t.b;
    }

    /// Scalar fill of samples `from..` of chroma row `cy`.
    fn fill_from(&mut self, p: &Yuv420<'_>, cy: usize, from: usize, c: &Coefficients) {
        let (u, v, step) = p.chroma_rows(cy);
        for i in from..self.len() {
            self.set(i, c.chroma(u[i * step], v[i * step]));
        }
    }
}

/// Pixels `x..` of one luma row against cached chroma terms.
#[inline(always)]
pub(crate) fn terms_px(
    y: &[u8],
    terms: &TermRows<'_>,
    x: usize,
    dst: &mut [u8],
    f: PackedFormat,
    c: &Coefficients,
) {
    let bpp = f.bpp();
    for (k, (&l, d)) in y[x..]
        .iter()
        .zip(dst[x * bpp..].chunks_exact_mut(bpp))
        .enumerate()
    {
        store_px(d, c.apply(l, terms.at((x + k) / 2)), f);
    }
}

/// Scratch for one chroma row of terms, or `None` after logging why the
/// call drops to the CPU kernel.
fn term_scratch(allocator: &AlignedAllocator, g: &Geometry, kernel: Kernel) -> Option<AlignedBuf> {
    match allocator.allocate(g.chroma_width() * TERM_BYTES) {
        Ok(buf) => Some(buf),
        Err(e) => {
            log::warn!("{e}; {} falls back to the CPU kernel", kernel.backend());
            None
        }
    }
}

// ===========================================================================
// Output pixel store
// ===========================================================================

#[inline(always)]
pub(crate) fn store_px(d: &mut [u8], [r, g, b]: [u8; 3], f: PackedFormat) {
    if f.is_bgr() {
        d[0] = b;
        d[2] = r;
    } else {
        d[0] = r;
        d[2] = b;
    }
    d[1] = g;
    if f.has_alpha() {
        d[3] = 0xFF;
    }
}

// ===========================================================================
// Entry
// ===========================================================================

/// Validate then convert a whole frame with the resolved kernel.
#[allow(clippy::too_many_arguments)]
pub(crate) fn yuv_to_packed(
    kernel: Kernel,
    allocator: &AlignedAllocator,
    src: &YuvSource<'_>,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: isize,
    format: PackedFormat,
    color: ColorSpace,
) -> Result<(), ConvertError> {
    let g = Geometry::new(width, height)?;
    let source = Source::validate(src, &g)?;
    check_plane(dst.len(), row_bytes(width, format.bpp())?, g.rows, dst_stride)?;
    let c = color.coefficients();

    match kernel {
        Kernel::Scalar(t) => yuv_plane_scalar(t, &source, dst, dst_stride, g, format, c),
        #[cfg(target_arch = "x86_64")]
        Kernel::Avx2(t) => match source {
            Source::Planar420(p) => {
                let Some(mut scratch) = term_scratch(allocator, &g, kernel) else {
                    yuv_plane_scalar(ScalarToken, &source, dst, dst_stride, g, format, c);
                    return Ok(());
                };
                let mut terms =
                    TermRows::split(cast_slice_mut(scratch.as_mut_slice()), g.chroma_width());
                yuv420_plane_v3(t, &p, &mut terms, dst, dst_stride, g, format, c);
            }
            Source::Packed422(p) => yuv422_plane_v3(t, &p, dst, dst_stride, g, format, c),
        },
        #[cfg(target_arch = "aarch64")]
        Kernel::Neon(t) => match source {
            Source::Planar420(p) => {
                let Some(mut scratch) = term_scratch(allocator, &g, kernel) else {
                    yuv_plane_scalar(ScalarToken, &source, dst, dst_stride, g, format, c);
                    return Ok(());
                };
                let mut terms =
                    TermRows::split(cast_slice_mut(scratch.as_mut_slice()), g.chroma_width());
                yuv420_plane_neon(t, &p, &mut terms, dst, dst_stride, g, format, c);
            }
            Source::Packed422(p) => yuv422_plane_neon(t, &p, dst, dst_stride, g, format, c),
        },
    }
    Ok(())
}
