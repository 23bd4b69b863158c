//! Crate-root functions as a capture pipeline would call them.
//!
//! Nothing here changes the global backend or resets the shared allocator;
//! that lives in `global_state.rs`.

use camconv::{
    ACCELERATED_TOLERANCE, ALIGNMENT, AlignedAllocator, ColorRange, ColorSpace, ColorStandard,
    ConvertBackend, ConvertError, PackedFormat, Plane, YuvSource,
};

#[test]
fn bgra_frame_to_rgb24_with_padding() {
    // 3x2 BGRA, source stride 16, destination stride 12
    let mut src = vec![0u8; 16 * 2];
    for y in 0..2 {
        for x in 0..3 {
            src[y * 16 + x * 4..][..4].copy_from_slice(&[10 * x as u8, 100, 200 + y as u8, 7]);
        }
    }
    let mut dst = vec![0xEEu8; 12 * 2];
    camconv::bgra_to_rgb(&src, 16, &mut dst, 12, 3, 2).unwrap();
    for y in 0..2 {
        for x in 0..3 {
            assert_eq!(&dst[y * 12 + x * 3..][..3], [200 + y as u8, 100, 10 * x as u8]);
        }
        assert_eq!(&dst[y * 12 + 9..y * 12 + 12], [0xEE; 3]);
    }
}

#[test]
fn generic_shuffle_rotates_channels() {
    let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let mut dst = [0u8; 8];
    camconv::shuffle(&src, 8, 4, &mut dst, 8, 4, 2, 1, &[3, 0, 1, 2]).unwrap();
    assert_eq!(dst, [4, 1, 2, 3, 8, 5, 6, 7]);
}

#[test]
fn flipped_rgb_to_rgba() {
    let src = [1u8, 2, 3, 4, 5, 6];
    let mut dst = [0u8; 8];
    camconv::rgb_to_rgba(&src, 3, &mut dst, 4, 1, -2).unwrap();
    assert_eq!(dst, [4, 5, 6, 255, 1, 2, 3, 255]);
}

#[test]
fn nv12_video_range_extremes() {
    let (w, h) = (16usize, 2usize);
    let mut y = vec![16u8; w * h];
    y[w..].fill(235);
    let uv = vec![128u8; w];
    let mut dst = vec![0u8; w * h * 4];
    let cs = ColorSpace::BT601_VIDEO;
    camconv::nv12_to_bgra32(&y, w, &uv, w, &mut dst, w * 4, w, h as isize, cs).unwrap();
    assert!(dst[..w * 4].chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    assert!(dst[w * 4..].iter().all(|&b| b == 255));
}

#[test]
fn i420_red_block() {
    // BT.601 video red: Y=81 U=90 V=240
    let (w, h) = (2usize, 2usize);
    let y = [81u8; 4];
    let mut dst = [0u8; 12];
    let cs = ColorSpace::default();
    camconv::i420_to_rgb24(&y, w, &[90], 1, &[240], 1, &mut dst, w * 3, w, h as isize, cs).unwrap();
    let want = camconv::yuv_to_rgb_601v(81, 90, 240);
    for px in dst.chunks_exact(3) {
        assert_eq!(px, want);
    }
    assert!(want[0] >= 250 && want[1] <= 3 && want[2] <= 3, "{want:?}");
}

#[test]
fn odd_width_yuyv_uses_first_luma_of_last_macropixel() {
    // width 3: macropixels (Y0 U Y1 V) = (50 128 60 128), (70 128 90 128)
    let src = [50u8, 128, 60, 128, 70, 128, 90, 128];
    let mut dst = [0u8; 9];
    camconv::yuyv_to_rgb24(&src, 8, &mut dst, 9, 3, 1, ColorSpace::BT601_FULL).unwrap();
    assert_eq!(dst, [50, 50, 50, 60, 60, 60, 70, 70, 70]);
}

#[test]
fn uyvy_matches_yuyv() {
    let yuyv = [50u8, 100, 60, 200, 70, 30, 90, 220];
    let uyvy = [100u8, 50, 200, 60, 30, 70, 220, 90];
    let mut a = [0u8; 16];
    let mut b = [0u8; 16];
    camconv::yuyv_to_rgba32(&yuyv, 8, &mut a, 16, 4, 1, ColorSpace::BT709_FULL).unwrap();
    camconv::uyvy_to_rgba32(&uyvy, 8, &mut b, 16, 4, 1, ColorSpace::BT709_FULL).unwrap();
    assert_eq!(a, b);
}

#[test]
fn generic_yuv_entry_point() {
    let (w, h) = (9usize, 3usize);
    let y = vec![128u8; w * h];
    let uv = vec![128u8; 10 * 2];
    let src = YuvSource::Nv21 {
        y: Plane::new(&y, w),
        vu: Plane::new(&uv, 10),
    };
    let mut dst = vec![0u8; w * h * 3];
    let (fmt, cs) = (PackedFormat::Rgb24, ColorSpace::BT709_FULL);
    camconv::yuv_to_packed(&src, &mut dst, w * 3, w, h as isize, fmt, cs).unwrap();
    assert!(dst.iter().all(|&b| b.abs_diff(128) <= ACCELERATED_TOLERANCE));
}

#[test]
fn pixel_math_entry_points_agree() {
    let named: [(ColorStandard, ColorRange, fn(u8, u8, u8) -> [u8; 3]); 4] = [
        (ColorStandard::Bt601, ColorRange::Video, camconv::yuv_to_rgb_601v),
        (ColorStandard::Bt709, ColorRange::Video, camconv::yuv_to_rgb_709v),
        (ColorStandard::Bt601, ColorRange::Full, camconv::yuv_to_rgb_601f),
        (ColorStandard::Bt709, ColorRange::Full, camconv::yuv_to_rgb_709f),
    ];
    for (standard, range, f) in named {
        for (y, u, v) in [(16u8, 128u8, 128u8), (235, 16, 240), (0, 255, 0), (200, 60, 180)] {
            assert_eq!(camconv::yuv_to_rgb(y, u, v, standard, range), f(y, u, v));
        }
    }
    assert_eq!(camconv::yuv_to_rgb_709f(0, 128, 128), [0, 0, 0]);
    assert_eq!(camconv::yuv_to_rgb_709f(255, 128, 128), [255, 255, 255]);
}

#[test]
fn errors_display_and_compare() {
    let mut dst = [0u8; 4];
    let err = camconv::rgba_to_bgra(&[0u8; 4], 4, &mut dst, 4, 2, 1).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidArgument(_)));
    assert!(err.to_string().starts_with("invalid argument"));

    let unavailable = ConvertError::BackendUnavailable(ConvertBackend::Neon);
    assert_eq!(unavailable.to_string(), "backend neon is not supported or is disabled");
    let boxed: Box<dyn std::error::Error> = Box::new(ConvertError::AllocationFailure { bytes: 64 });
    assert_eq!(boxed.to_string(), "failed to allocate 64 aligned bytes");
}

#[test]
fn private_allocator_accounting() {
    let alloc = AlignedAllocator::new();
    let mut a = alloc.allocate(100).unwrap();
    let b = alloc.allocate(ALIGNMENT + 1).unwrap();
    assert_eq!(a.as_ptr() as usize % ALIGNMENT, 0);
    assert_eq!(b.as_ptr() as usize % ALIGNMENT, 0);
    assert_eq!((a.len(), b.len()), (100, ALIGNMENT + 1));
    assert_eq!(alloc.size(), 100 + ALIGNMENT + 1);
    a.fill(7);
    assert!(a.iter().all(|&x| x == 7));
    drop(a);
    assert_eq!(alloc.size(), ALIGNMENT + 1);
    alloc.reset();
    assert_eq!(alloc.size(), 0);
    drop(b);
    assert_eq!(alloc.size(), 0);
}

#[test]
fn capability_queries_are_consistent() {
    assert_eq!(camconv::has_vector_isa(), ConvertBackend::Avx2.is_supported());
    assert_eq!(camconv::has_platform_accelerator(), ConvertBackend::Neon.is_supported());
    assert!(ConvertBackend::Cpu.is_supported());
}
