//! Validates the code examples from README.md compile and behave correctly.

#[test]
fn readme_nv12_and_shuffle() {
    use camconv::ColorSpace;

    // 2x2 NV12 frame, white
    let y = [235u8; 4];
    let uv = [128u8, 128];
    let mut bgra = [0u8; 16];
    camconv::nv12_to_bgra32(&y, 2, &uv, 2, &mut bgra, 8, 2, 2, ColorSpace::BT601_VIDEO).unwrap();
    assert_eq!(bgra, [255; 16]);

    // RGBA → BGR, written bottom-up
    let rgba = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let mut bgr = [0u8; 6];
    camconv::rgba_to_bgr(&rgba, 4, &mut bgr, 3, 1, -2).unwrap();
    assert_eq!(bgr, [7, 6, 5, 3, 2, 1]);
}

#[test]
fn readme_isolated_converter() {
    use camconv::{ColorSpace, ConvertBackend, Converter};

    let c = Converter::new();
    assert!(c.set_backend(ConvertBackend::Cpu));
    let y = [235u8; 4];
    let uv = [128u8, 128];
    let mut rgb = [0u8; 12];
    c.nv12_to_rgb24(&y, 2, &uv, 2, &mut rgb, 6, 2, 2, ColorSpace::BT601_VIDEO).unwrap();
    assert_eq!(rgb, [255; 12]);
    assert_eq!(c.allocator().size(), 0);
}
