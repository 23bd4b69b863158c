//! # camconv
//!
//! Pixel conversions for camera capture pipelines: channel shuffles between
//! packed RGB-family layouts and YUV (NV12, NV21, I420, YUYV, UYVY) to
//! RGB24/BGR24/RGBA32/BGRA32, with runtime backend dispatch across x86-64
//! AVX2, AArch64 NEON and a portable scalar reference.
//!
//! ## Buffers
//!
//! Every bulk entry point takes a byte slice and a row stride per plane, a
//! `width` in pixels and a signed `height`. A negative height processes
//! `|height|` rows and writes them bottom-up, so output row 0 holds the last
//! input row. Arguments are validated before anything is written; a call
//! that returns an error leaves the destination untouched.
//!
//! ## Backends
//!
//! The crate-root functions run on [`Converter::global`]. Its backend starts
//! as [`ConvertBackend::Auto`] (NEON, then AVX2, then CPU) unless
//! `CAMCONV_BACKEND` names another. [`Converter::new`] builds an isolated
//! instance whose selection nothing else can change.
//!
//! Shuffles are byte-identical on every backend. YUV output from AVX2 is
//! byte-identical to the CPU kernel; NEON output is within
//! [`ACCELERATED_TOLERANCE`] per channel.
//!
//! ## Feature flags
//!
//! - **`rgb`**: slice conversions over [`rgb`] crate pixel types.
//! - **`imgref`**: whole-image conversions over [`imgref`] types. Implies
//!   `rgb`.

#![forbid(unsafe_code)]

mod aligned;
mod backend;
mod color;
mod converter;
mod cpu;
mod error;
mod format;
mod layout;
mod shuffle;
mod yuv;

pub use aligned::{
    ALIGNMENT, AlignedAllocator, AlignedBuf, allocator_size, reset_shared_allocator,
    shared_allocator,
};
pub use backend::{BackendManager, ConvertBackend};
pub use color::{
    ColorRange, ColorSpace, ColorStandard, yuv_to_rgb, yuv_to_rgb_601f, yuv_to_rgb_601v,
    yuv_to_rgb_709f, yuv_to_rgb_709v,
};
pub use converter::*;
pub use cpu::{has_platform_accelerator, has_vector_isa};
pub use error::ConvertError;
pub use format::PackedFormat;
pub use yuv::{ACCELERATED_TOLERANCE, Plane, YuvSource};

#[cfg(feature = "rgb")]
pub mod typed;

#[cfg(feature = "imgref")]
pub mod img;
