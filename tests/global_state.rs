//! Backend control and the shared allocator on the process-wide converter.
//!
//! One test, run in sequence, because every step observes global state.

use camconv::{ColorSpace, ConvertBackend, ConvertError, Converter};

fn convert_once() -> Result<(), ConvertError> {
    let (w, h) = (40usize, 2usize);
    let y = vec![90u8; w * h];
    let uv = vec![100u8; w];
    let mut dst = vec![0u8; w * h * 4];
    camconv::nv12_to_rgba32(&y, w, &uv, w, &mut dst, w * 4, w, h as isize, ColorSpace::default())
}

#[test]
fn global_backend_and_allocator() {
    // Selection starts at Auto unless the environment overrides it.
    if std::env::var_os(camconv::BACKEND_ENV).is_none() {
        assert_eq!(Converter::global().backends().selected(), ConvertBackend::Auto);
    }
    assert!(camconv::set_backend(ConvertBackend::Auto));
    let auto_pick = camconv::backend();
    assert_ne!(auto_pick, ConvertBackend::Auto);
    assert!(auto_pick.is_supported());

    // Cpu is always selectable and cannot be disabled.
    assert!(camconv::set_backend(ConvertBackend::Cpu));
    assert_eq!(camconv::backend(), ConvertBackend::Cpu);
    assert!(camconv::disable_backend(ConvertBackend::Cpu));
    assert!(camconv::is_backend_enabled(ConvertBackend::Cpu));
    convert_once().unwrap();

    // Auto is not a toggleable backend.
    assert!(!camconv::enable_backend(ConvertBackend::Auto));
    assert!(!camconv::disable_backend(ConvertBackend::Auto));

    for b in [ConvertBackend::Avx2, ConvertBackend::Neon] {
        if b.is_supported() {
            assert!(camconv::set_backend(b));
            assert_eq!(camconv::backend(), b);
            convert_once().unwrap();

            assert!(camconv::disable_backend(b));
            assert!(!camconv::is_backend_enabled(b));
            assert_eq!(convert_once(), Err(ConvertError::BackendUnavailable(b)));
            assert!(!camconv::set_backend(b));

            // Auto skips the disabled backend.
            assert!(camconv::set_backend(ConvertBackend::Auto));
            assert_ne!(camconv::backend(), b);
            convert_once().unwrap();

            assert!(camconv::enable_backend(b));
            assert!(camconv::is_backend_enabled(b));
        } else {
            assert!(!camconv::set_backend(b));
            assert!(!camconv::enable_backend(b));
        }
    }

    assert!(camconv::set_backend(ConvertBackend::Auto));
    assert_eq!(camconv::backend(), auto_pick);

    // Scratch goes back to the shared allocator after each call.
    convert_once().unwrap();
    assert_eq!(camconv::allocator_size(), 0);

    let shared = camconv::shared_allocator();
    let held = shared.allocate(1000).unwrap();
    assert_eq!(camconv::allocator_size(), 1000);
    convert_once().unwrap();
    assert_eq!(camconv::allocator_size(), 1000);
    camconv::reset_shared_allocator();
    assert_eq!(camconv::allocator_size(), 0);
    drop(held);
    assert_eq!(camconv::allocator_size(), 0);
}
