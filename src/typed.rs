//! Conversions over [`rgb`] crate pixel types.
//!
//! Slices are reinterpreted as bytes with bytemuck and handed to the global
//! [`Converter`] as a single row, so they take the same SIMD paths as the
//! byte API.
//!
//! ```rust
//! use rgb::{Bgra, Rgb};
//! use camconv::typed;
//!
//! let rgb_pixels = vec![Rgb::new(255u8, 0, 128); 100];
//! let mut bgra = vec![Bgra::default(); 100];
//! typed::rgb_to_bgra_buf(&rgb_pixels, &mut bgra).unwrap();
//! assert_eq!(bgra[0], Bgra { b: 128, g: 0, r: 255, a: 255 });
//! ```

use bytemuck::Pod;
use rgb::{Bgr, Bgra, Rgb, Rgba};

use crate::{ColorSpace, ConvertError, Converter, PackedFormat, YuvSource};

// ---------------------------------------------------------------------------
// Pixel types the YUV engine can write
// ---------------------------------------------------------------------------

/// An 8-bit `rgb` pixel type with a matching [`PackedFormat`].
pub trait PackedPixel: Pod + Default {
    const FORMAT: PackedFormat;
}

impl PackedPixel for Rgb<u8> {
    const FORMAT: PackedFormat = PackedFormat::Rgb24;
}

impl PackedPixel for Bgr<u8> {
    const FORMAT: PackedFormat = PackedFormat::Bgr24;
}

impl PackedPixel for Rgba<u8> {
    const FORMAT: PackedFormat = PackedFormat::Rgba32;
}

impl PackedPixel for Bgra<u8> {
    const FORMAT: PackedFormat = PackedFormat::Bgra32;
}

// ---------------------------------------------------------------------------
// Shuffles
// ---------------------------------------------------------------------------

type NamedShuffle =
    fn(&Converter, &[u8], usize, &mut [u8], usize, usize, isize) -> Result<(), ConvertError>;

fn run<S: Pod, D: Pod>(src: &[S], dst: &mut [D], op: NamedShuffle) -> Result<(), ConvertError> {
    if src.len() != dst.len() {
        return Err(ConvertError::InvalidArgument("pixel count mismatch"));
    }
    if src.is_empty() {
        return Ok(());
    }
    let width = src.len();
    let src_bytes: &[u8] = bytemuck::cast_slice(src);
    let dst_bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
    let (ss, ds) = (src_bytes.len(), dst_bytes.len());
    op(Converter::global(), src_bytes, ss, dst_bytes, ds, width, 1)
}

macro_rules! typed_shuffles {
    ($($(#[$doc:meta])* $name:ident($src:ty => $dst:ty) = $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(src: &[$src], dst: &mut [$dst]) -> Result<(), ConvertError> {
                run(src, dst, Converter::$op)
            }
        )*
    };
}

typed_shuffles! {
    /// Copy `Rgba` into `Bgra`, swapping R↔B.
    rgba_to_bgra_buf(Rgba<u8> => Bgra<u8>) = rgba_to_bgra;
    /// Copy `Bgra` into `Rgba`, swapping B↔R.
    bgra_to_rgba_buf(Bgra<u8> => Rgba<u8>) = bgra_to_rgba;
    /// Copy `Rgb` into `Bgr`, swapping R↔B.
    rgb_to_bgr_buf(Rgb<u8> => Bgr<u8>) = rgb_to_bgr;
    /// Copy `Bgr` into `Rgb`, swapping B↔R.
    bgr_to_rgb_buf(Bgr<u8> => Rgb<u8>) = bgr_to_rgb;
    /// Drop alpha.
    rgba_to_rgb_buf(Rgba<u8> => Rgb<u8>) = rgba_to_rgb;
    /// Drop alpha.
    bgra_to_bgr_buf(Bgra<u8> => Bgr<u8>) = bgra_to_bgr;
    /// Drop alpha and swap R↔B.
    rgba_to_bgr_buf(Rgba<u8> => Bgr<u8>) = rgba_to_bgr;
    /// Drop alpha and swap B↔R.
    bgra_to_rgb_buf(Bgra<u8> => Rgb<u8>) = bgra_to_rgb;
    /// Add alpha = 255.
    rgb_to_rgba_buf(Rgb<u8> => Rgba<u8>) = rgb_to_rgba;
    /// Add alpha = 255.
    bgr_to_bgra_buf(Bgr<u8> => Bgra<u8>) = bgr_to_bgra;
    /// Swap R↔B and add alpha = 255.
    rgb_to_bgra_buf(Rgb<u8> => Bgra<u8>) = rgb_to_bgra;
    /// Swap B↔R and add alpha = 255.
    bgr_to_rgba_buf(Bgr<u8> => Rgba<u8>) = bgr_to_rgba;
}

// ---------------------------------------------------------------------------
// YUV
// ---------------------------------------------------------------------------

/// Decode a YUV frame into a tightly packed pixel slice of
/// `width × |height|` pixels.
pub fn yuv_to_pixels<P: PackedPixel>(
    src: &YuvSource<'_>,
    dst: &mut [P],
    width: usize,
    height: isize,
    color: ColorSpace,
) -> Result<(), ConvertError> {
    let stride = width
        .checked_mul(P::FORMAT.bpp())
        .ok_or(ConvertError::InvalidArgument("row size overflows usize"))?;
    let dst_bytes: &mut [u8] = bytemuck::cast_slice_mut(dst);
    Converter::global().yuv_to_packed(src, dst_bytes, stride, width, height, P::FORMAT, color)
}

/// One pixel through the scalar math, as an `Rgb`.
pub fn yuv_px_to_rgb(y: u8, u: u8, v: u8, color: ColorSpace) -> Rgb<u8> {
    let [r, g, b] = crate::yuv_to_rgb(y, u, v, color.standard, color.range);
    Rgb::new(r, g, b)
}
