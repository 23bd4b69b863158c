//! The conversion context and the free-function API over its global
//! instance.

use std::sync::OnceLock;

use crate::aligned::{AlignedAllocator, shared_allocator};
use crate::backend::{BackendManager, ConvertBackend};
use crate::shuffle::{ChannelMap, shuffle_plane};
use crate::yuv::{self, Plane, YuvSource};
use crate::{ColorSpace, ConvertError, PackedFormat};

/// Environment variable read once when the global [`Converter`] is created.
/// Accepts `auto`, `cpu`, `avx2` or `neon`.
pub const BACKEND_ENV: &str = "CAMCONV_BACKEND";

/// Backend selection plus scratch allocator.
///
/// [`Converter::global`] backs the crate-root functions. Build a separate
/// instance with [`Converter::new`] to get backend state that nothing else
/// in the process can change.
#[derive(Debug, Default)]
pub struct Converter {
    backends: BackendManager,
    allocator: AlignedAllocator,
}

static GLOBAL: OnceLock<Converter> = OnceLock::new();

impl Converter {
    /// Fresh `Auto` selection with a private allocator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allocator(allocator: AlignedAllocator) -> Self {
        Self {
            backends: BackendManager::new(),
            allocator,
        }
    }

    /// The process-wide instance, using the shared allocator. Created on
    /// first use, honoring [`BACKEND_ENV`].
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let c = Self::with_allocator(shared_allocator());
            c.apply_env();
            c
        })
    }

    fn apply_env(&self) {
        if let Ok(value) = std::env::var(BACKEND_ENV) {
            self.apply_backend_name(&value);
        }
    }

    fn apply_backend_name(&self, value: &str) {
        match value.parse::<ConvertBackend>() {
            Ok(b) if self.backends.set_backend(b) => {
                log::debug!("{BACKEND_ENV}={value}: backend {b} selected");
            }
            Ok(b) => log::warn!("{BACKEND_ENV}={value}: backend {b} unavailable, keeping auto"),
            Err(e) => log::warn!("{BACKEND_ENV}={value}: {e}, keeping auto"),
        }
    }

    pub fn backends(&self) -> &BackendManager {
        &self.backends
    }

    pub fn allocator(&self) -> &AlignedAllocator {
        &self.allocator
    }

    /// See [`BackendManager::backend`].
    pub fn backend(&self) -> ConvertBackend {
        self.backends.backend()
    }

    /// See [`BackendManager::set_backend`].
    pub fn set_backend(&self, backend: ConvertBackend) -> bool {
        self.backends.set_backend(backend)
    }

    /// Generic channel shuffle.
    ///
    /// `src_channels` and `dst_channels` are 3 or 4. `map[c]` names the
    /// source channel written to destination channel `c`; it has four
    /// entries for 4→4 and three otherwise. A 3→4 shuffle writes 255 into
    /// the fourth channel. A negative `height` flips the output vertically.
    #[allow(clippy::too_many_arguments)]
    pub fn shuffle(
        &self,
        src: &[u8],
        src_stride: usize,
        src_channels: usize,
        dst: &mut [u8],
        dst_stride: usize,
        dst_channels: usize,
        width: usize,
        height: isize,
        map: &[u8],
    ) -> Result<(), ConvertError> {
        let map = ChannelMap::new(src_channels, dst_channels, map)?;
        self.run_shuffle(&map, src, src_stride, dst, dst_stride, width, height)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_shuffle(
        &self,
        map: &ChannelMap,
        src: &[u8],
        src_stride: usize,
        dst: &mut [u8],
        dst_stride: usize,
        width: usize,
        height: isize,
    ) -> Result<(), ConvertError> {
        let kernel = self.backends.kernel()?;
        shuffle_plane(kernel, src, src_stride, dst, dst_stride, width, height, map)
    }

    /// Convert any [`YuvSource`] into a packed RGB-family buffer.
    ///
    /// A negative `height` flips the output vertically. Under `Auto`, or
    /// when scratch memory cannot be allocated, the call degrades toward the
    /// CPU kernel instead of failing.
    #[allow(clippy::too_many_arguments)]
    pub fn yuv_to_packed(
        &self,
        src: &YuvSource<'_>,
        dst: &mut [u8],
        dst_stride: usize,
        width: usize,
        height: isize,
        format: PackedFormat,
        color: ColorSpace,
    ) -> Result<(), ConvertError> {
        let kernel = self.backends.kernel()?;
        yuv::yuv_to_packed(
            kernel,
            &self.allocator,
            src,
            dst,
            dst_stride,
            width,
            height,
            format,
            color,
        )
    }
}

// ===========================================================================
// Named conversions: a Converter method plus a crate-root function on the
// global instance for each.
// ===========================================================================

macro_rules! named_shuffles {
    ($($(#[$doc:meta])* $name:ident => $map:ident;)*) => {
        impl Converter {
            $(
                $(#[$doc])*
                pub fn $name(
                    &self,
                    src: &[u8],
                    src_stride: usize,
                    dst: &mut [u8],
                    dst_stride: usize,
                    width: usize,
                    height: isize,
                ) -> Result<(), ConvertError> {
                    let map = &ChannelMap::$map;
                    self.run_shuffle(map, src, src_stride, dst, dst_stride, width, height)
                }
            )*
        }

        $(
            $(#[$doc])*
            pub fn $name(
                src: &[u8],
                src_stride: usize,
                dst: &mut [u8],
                dst_stride: usize,
                width: usize,
                height: isize,
            ) -> Result<(), ConvertError> {
                Converter::global().$name(src, src_stride, dst, dst_stride, width, height)
            }
        )*
    };
}

named_shuffles! {
    /// RGBA → BGRA (swap R and B, keep alpha).
    rgba_to_bgra => SWAP_RB_4;
    /// BGRA → RGBA (swap R and B, keep alpha).
    bgra_to_rgba => SWAP_RB_4;
    /// RGB → BGR.
    rgb_to_bgr => SWAP_RB_3;
    /// BGR → RGB.
    bgr_to_rgb => SWAP_RB_3;
    /// RGBA → RGB (drop alpha).
    rgba_to_rgb => DROP_ALPHA;
    /// BGRA → BGR (drop alpha).
    bgra_to_bgr => DROP_ALPHA;
    /// RGBA → BGR (drop alpha, swap R and B).
    rgba_to_bgr => DROP_ALPHA_SWAP_RB;
    /// BGRA → RGB (drop alpha, swap R and B).
    bgra_to_rgb => DROP_ALPHA_SWAP_RB;
    /// RGB → RGBA, alpha = 255.
    rgb_to_rgba => ADD_ALPHA;
    /// BGR → BGRA, alpha = 255.
    bgr_to_bgra => ADD_ALPHA;
    /// RGB → BGRA, alpha = 255.
    rgb_to_bgra => ADD_ALPHA_SWAP_RB;
    /// BGR → RGBA, alpha = 255.
    bgr_to_rgba => ADD_ALPHA_SWAP_RB;
}

macro_rules! semi_planar {
    ($variant:ident { $y:ident, $c:ident }: $($name:ident => $fmt:ident),* $(,)?) => {
        impl Converter {
            $(
                #[doc = concat!("`", stringify!($variant), "` → `", stringify!($fmt), "`.")]
                #[allow(clippy::too_many_arguments)]
                pub fn $name(
                    &self,
                    y: &[u8],
                    y_stride: usize,
                    chroma: &[u8],
                    chroma_stride: usize,
                    dst: &mut [u8],
                    dst_stride: usize,
                    width: usize,
                    height: isize,
                    color: ColorSpace,
                ) -> Result<(), ConvertError> {
                    let src = YuvSource::$variant {
                        $y: Plane::new(y, y_stride),
                        $c: Plane::new(chroma, chroma_stride),
                    };
                    let fmt = PackedFormat::$fmt;
                    self.yuv_to_packed(&src, dst, dst_stride, width, height, fmt, color)
                }
            )*
        }

        $(
            #[doc = concat!(
                "`", stringify!($variant), "` → `", stringify!($fmt), "` on the global converter."
            )]
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                y: &[u8],
                y_stride: usize,
                chroma: &[u8],
                chroma_stride: usize,
                dst: &mut [u8],
                dst_stride: usize,
                width: usize,
                height: isize,
                color: ColorSpace,
            ) -> Result<(), ConvertError> {
                Converter::global().$name(
                    y, y_stride, chroma, chroma_stride, dst, dst_stride, width, height, color,
                )
            }
        )*
    };
}

semi_planar!(Nv12 { y, uv }:
    nv12_to_rgb24 => Rgb24,
    nv12_to_bgr24 => Bgr24,
    nv12_to_rgba32 => Rgba32,
    nv12_to_bgra32 => Bgra32,
);

semi_planar!(Nv21 { y, vu }:
    nv21_to_rgb24 => Rgb24,
    nv21_to_bgr24 => Bgr24,
    nv21_to_rgba32 => Rgba32,
    nv21_to_bgra32 => Bgra32,
);

macro_rules! planar {
    ($($name:ident => $fmt:ident),* $(,)?) => {
        impl Converter {
            $(
                #[doc = concat!("`I420` → `", stringify!($fmt), "`.")]
                #[allow(clippy::too_many_arguments)]
                pub fn $name(
                    &self,
                    y: &[u8],
                    y_stride: usize,
                    u: &[u8],
                    u_stride: usize,
                    v: &[u8],
                    v_stride: usize,
                    dst: &mut [u8],
                    dst_stride: usize,
                    width: usize,
                    height: isize,
                    color: ColorSpace,
                ) -> Result<(), ConvertError> {
                    let src = YuvSource::I420 {
                        y: Plane::new(y, y_stride),
                        u: Plane::new(u, u_stride),
                        v: Plane::new(v, v_stride),
                    };
                    let fmt = PackedFormat::$fmt;
                    self.yuv_to_packed(&src, dst, dst_stride, width, height, fmt, color)
                }
            )*
        }

        $(
            #[doc = concat!("`I420` → `", stringify!($fmt), "` on the global converter.")]
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                y: &[u8],
                y_stride: usize,
                u: &[u8],
                u_stride: usize,
                v: &[u8],
                v_stride: usize,
                dst: &mut [u8],
                dst_stride: usize,
                width: usize,
                height: isize,
                color: ColorSpace,
            ) -> Result<(), ConvertError> {
                Converter::global().$name(
                    y, y_stride, u, u_stride, v, v_stride, dst, dst_stride, width, height, color,
                )
            }
        )*
    };
}

planar!(
    i420_to_rgb24 => Rgb24,
    i420_to_bgr24 => Bgr24,
    i420_to_rgba32 => Rgba32,
    i420_to_bgra32 => Bgra32,
);

macro_rules! packed_422 {
    ($variant:ident: $($name:ident => $fmt:ident),* $(,)?) => {
        impl Converter {
            $(
                #[doc = concat!("`", stringify!($variant), "` → `", stringify!($fmt), "`.")]
                #[allow(clippy::too_many_arguments)]
                pub fn $name(
                    &self,
                    src: &[u8],
                    src_stride: usize,
                    dst: &mut [u8],
                    dst_stride: usize,
                    width: usize,
                    height: isize,
                    color: ColorSpace,
                ) -> Result<(), ConvertError> {
                    let src = YuvSource::$variant(Plane::new(src, src_stride));
                    let fmt = PackedFormat::$fmt;
                    self.yuv_to_packed(&src, dst, dst_stride, width, height, fmt, color)
                }
            )*
        }

        $(
            #[doc = concat!(
                "`", stringify!($variant), "` → `", stringify!($fmt), "` on the global converter."
            )]
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                src: &[u8],
                src_stride: usize,
                dst: &mut [u8],
                dst_stride: usize,
                width: usize,
                height: isize,
                color: ColorSpace,
            ) -> Result<(), ConvertError> {
                Converter::global().$name(src, src_stride, dst, dst_stride, width, height, color)
            }
        )*
    };
}

packed_422!(Yuyv:
    yuyv_to_rgb24 => Rgb24,
    yuyv_to_bgr24 => Bgr24,
    yuyv_to_rgba32 => Rgba32,
    yuyv_to_bgra32 => Bgra32,
);

packed_422!(Uyvy:
    uyvy_to_rgb24 => Rgb24,
    uyvy_to_bgr24 => Bgr24,
    uyvy_to_rgba32 => Rgba32,
    uyvy_to_bgra32 => Bgra32,
);

// ===========================================================================
// Global-instance helpers
// ===========================================================================

/// Generic channel shuffle on the global converter. See
/// [`Converter::shuffle`].
#[allow(clippy::too_many_arguments)]
pub fn shuffle(
    src: &[u8],
    src_stride: usize,
    src_channels: usize,
    dst: &mut [u8],
    dst_stride: usize,
    dst_channels: usize,
    width: usize,
    height: isize,
    map: &[u8],
) -> Result<(), ConvertError> {
    Converter::global().shuffle(
        src,
        src_stride,
        src_channels,
        dst,
        dst_stride,
        dst_channels,
        width,
        height,
        map,
    )
}

/// Generic YUV conversion on the global converter. See
/// [`Converter::yuv_to_packed`].
pub fn yuv_to_packed(
    src: &YuvSource<'_>,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: isize,
    format: PackedFormat,
    color: ColorSpace,
) -> Result<(), ConvertError> {
    Converter::global().yuv_to_packed(src, dst, dst_stride, width, height, format, color)
}

/// Concrete backend the global converter would use now.
pub fn backend() -> ConvertBackend {
    Converter::global().backend()
}

/// Select the global converter's backend. See [`BackendManager::set_backend`].
pub fn set_backend(backend: ConvertBackend) -> bool {
    Converter::global().set_backend(backend)
}

pub fn is_backend_enabled(backend: ConvertBackend) -> bool {
    Converter::global().backends().is_enabled(backend)
}

pub fn enable_backend(backend: ConvertBackend) -> bool {
    Converter::global().backends().enable(backend)
}

pub fn disable_backend(backend: ConvertBackend) -> bool {
    Converter::global().backends().disable(backend)
}
