//! Whole-image conversions over [`imgref`] types.
//!
//! Sources may be strided; results are tightly packed [`ImgVec`]s. Every
//! function runs on the global [`Converter`].
//!
//! ```rust
//! use rgb::{Bgra, Rgb};
//! use imgref::ImgVec;
//! use camconv::img;
//!
//! let rgb_img = ImgVec::new(vec![Rgb::new(255u8, 0, 128); 100], 10, 10);
//! let bgra_img: ImgVec<Bgra<u8>> = img::convert_rgb_to_bgra(rgb_img.as_ref()).unwrap();
//! assert_eq!(bgra_img.width(), 10);
//! ```

use bytemuck::Pod;
use imgref::{ImgRef, ImgVec};
use rgb::{Bgr, Bgra, Rgb, Rgba};

use crate::typed::PackedPixel;
use crate::{ColorSpace, ConvertError, Converter, Plane, YuvSource};

type NamedShuffle =
    fn(&Converter, &[u8], usize, &mut [u8], usize, usize, isize) -> Result<(), ConvertError>;

fn byte_stride<T>(stride: usize) -> usize {
    stride * core::mem::size_of::<T>()
}

fn convert_img<S: Pod, D: Pod + Default>(
    img: ImgRef<'_, S>,
    op: NamedShuffle,
) -> Result<ImgVec<D>, ConvertError> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(ConvertError::InvalidArgument("empty image"));
    }
    let mut dst = ImgVec::new(vec![D::default(); w * h], w, h);
    let src: &[S] = img.into_buf();
    let out: &mut [D] = dst.buf_mut();
    let dst_bytes: &mut [u8] = bytemuck::cast_slice_mut(out);
    op(
        Converter::global(),
        bytemuck::cast_slice(src),
        byte_stride::<S>(img.stride()),
        dst_bytes,
        byte_stride::<D>(w),
        w,
        h as isize,
    )?;
    Ok(dst)
}

macro_rules! img_shuffles {
    ($($(#[$doc:meta])* $name:ident($src:ty => $dst:ty) = $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(img: ImgRef<'_, $src>) -> Result<ImgVec<$dst>, ConvertError> {
                convert_img(img, Converter::$op)
            }
        )*
    };
}

img_shuffles! {
    /// `Rgba` → `Bgra`.
    convert_rgba_to_bgra(Rgba<u8> => Bgra<u8>) = rgba_to_bgra;
    /// `Bgra` → `Rgba`.
    convert_bgra_to_rgba(Bgra<u8> => Rgba<u8>) = bgra_to_rgba;
    /// `Rgb` → `Bgr`.
    convert_rgb_to_bgr(Rgb<u8> => Bgr<u8>) = rgb_to_bgr;
    /// `Bgr` → `Rgb`.
    convert_bgr_to_rgb(Bgr<u8> => Rgb<u8>) = bgr_to_rgb;
    /// `Rgba` → `Rgb` (drop alpha).
    convert_rgba_to_rgb(Rgba<u8> => Rgb<u8>) = rgba_to_rgb;
    /// `Bgra` → `Bgr` (drop alpha).
    convert_bgra_to_bgr(Bgra<u8> => Bgr<u8>) = bgra_to_bgr;
    /// `Rgba` → `Bgr`.
    convert_rgba_to_bgr(Rgba<u8> => Bgr<u8>) = rgba_to_bgr;
    /// `Bgra` → `Rgb`.
    convert_bgra_to_rgb(Bgra<u8> => Rgb<u8>) = bgra_to_rgb;
    /// `Rgb` → `Rgba` (alpha = 255).
    convert_rgb_to_rgba(Rgb<u8> => Rgba<u8>) = rgb_to_rgba;
    /// `Bgr` → `Bgra` (alpha = 255).
    convert_bgr_to_bgra(Bgr<u8> => Bgra<u8>) = bgr_to_bgra;
    /// `Rgb` → `Bgra` (alpha = 255).
    convert_rgb_to_bgra(Rgb<u8> => Bgra<u8>) = rgb_to_bgra;
    /// `Bgr` → `Rgba` (alpha = 255).
    convert_bgr_to_rgba(Bgr<u8> => Rgba<u8>) = bgr_to_rgba;
}

// ---------------------------------------------------------------------------
// YUV decode
// ---------------------------------------------------------------------------

fn plane(img: ImgRef<'_, u8>) -> Plane<'_> {
    Plane::new(img.into_buf(), img.stride())
}

/// Decode any [`YuvSource`] into a new image. A negative `height` stores
/// the frame bottom-up.
pub fn yuv_to_img<P: PackedPixel>(
    src: &YuvSource<'_>,
    width: usize,
    height: isize,
    color: ColorSpace,
) -> Result<ImgVec<P>, ConvertError> {
    let rows = height.unsigned_abs();
    if width == 0 || rows == 0 {
        return Err(ConvertError::InvalidArgument("width and height must be non-zero"));
    }
    let mut dst = ImgVec::new(vec![P::default(); width * rows], width, rows);
    let out: &mut [P] = dst.buf_mut();
    crate::typed::yuv_to_pixels(src, out, width, height, color)?;
    Ok(dst)
}

/// Decode NV12. The luma image sets the frame size; `uv` is
/// `2·ceil(w/2)` bytes wide.
pub fn nv12_to_img<P: PackedPixel>(
    y: ImgRef<'_, u8>,
    uv: ImgRef<'_, u8>,
    color: ColorSpace,
) -> Result<ImgVec<P>, ConvertError> {
    let src = YuvSource::Nv12 {
        y: plane(y),
        uv: plane(uv),
    };
    yuv_to_img(&src, y.width(), y.height() as isize, color)
}

/// Decode I420 from three planes. The luma image sets the frame size.
pub fn i420_to_img<P: PackedPixel>(
    y: ImgRef<'_, u8>,
    u: ImgRef<'_, u8>,
    v: ImgRef<'_, u8>,
    color: ColorSpace,
) -> Result<ImgVec<P>, ConvertError> {
    let src = YuvSource::I420 {
        y: plane(y),
        u: plane(u),
        v: plane(v),
    };
    yuv_to_img(&src, y.width(), y.height() as isize, color)
}
