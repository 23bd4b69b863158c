//! Every public conversion under every reachable SIMD tier.
//!
//! Token permutations flip process-wide state, so these live in their own
//! test binary away from the unit tests that summon tokens directly.

use archmage::testing::{CompileTimePolicy, for_each_token_permutation};
use camconv::{ACCELERATED_TOLERANCE, ColorSpace, Converter, PackedFormat, Plane, YuvSource};

fn policy() -> CompileTimePolicy {
    if std::env::var_os("CI").is_some() {
        CompileTimePolicy::Fail
    } else {
        CompileTimePolicy::WarnStderr
    }
}

fn make_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 7 % 251) as u8).collect()
}

const WIDTHS: &[usize] = &[1, 3, 5, 8, 9, 16, 17, 33, 100];

fn ref_shuffle(src: &[u8], sc: usize, dc: usize, map: &[u8]) -> Vec<u8> {
    src.chunks_exact(sc)
        .flat_map(|s| (0..dc).map(move |c| map.get(c).map_or(0xFF, |&i| s[usize::from(i)])))
        .collect()
}

#[test]
fn permutation_shuffles() {
    let maps: [(usize, usize, &[u8]); 4] = [
        (4, 4, &[2, 1, 0, 3]),
        (3, 3, &[2, 1, 0]),
        (4, 3, &[2, 1, 0]),
        (3, 4, &[0, 1, 2]),
    ];
    let report = for_each_token_permutation(policy(), |perm| {
        let c = Converter::new();
        for &(sc, dc, map) in &maps {
            for &w in WIDTHS {
                let h = 3;
                let src = make_bytes(w * sc * h);
                let mut dst = vec![0u8; w * dc * h];
                c.shuffle(&src, w * sc, sc, &mut dst, w * dc, dc, w, h as isize, map)
                    .unwrap();
                assert_eq!(
                    dst,
                    ref_shuffle(&src, sc, dc, map),
                    "{sc}->{dc} w={w} tier={perm} backend={}",
                    c.backend()
                );
            }
        }
    });
    std::eprintln!("shuffles: {report}");
}

#[test]
fn permutation_nv12() {
    let report = for_each_token_permutation(policy(), |perm| {
        let c = Converter::new();
        for &w in WIDTHS {
            let h = 4;
            let cw = w.div_ceil(2);
            let y = make_bytes(w * h);
            let uv: Vec<u8> = make_bytes(cw * 2 * h / 2 + 5).split_off(5);
            for cs in ColorSpace::ALL {
                let mut dst = vec![0u8; w * h * 4];
                c.nv12_to_rgba32(&y, w, &uv, cw * 2, &mut dst, w * 4, w, h as isize, cs)
                    .unwrap();
                for row in 0..h {
                    for x in 0..w {
                        let ci = (row / 2) * cw * 2 + (x / 2) * 2;
                        let want = camconv::yuv_to_rgb(
                            y[row * w + x],
                            uv[ci],
                            uv[ci + 1],
                            cs.standard,
                            cs.range,
                        );
                        let got = &dst[(row * w + x) * 4..][..4];
                        for ch in 0..3 {
                            assert!(
                                got[ch].abs_diff(want[ch]) <= ACCELERATED_TOLERANCE,
                                "w={w} ({x},{row}) ch={ch} tier={perm} backend={}",
                                c.backend()
                            );
                        }
                        assert_eq!(got[3], 0xFF);
                    }
                }
            }
        }
    });
    std::eprintln!("nv12: {report}");
}

#[test]
fn permutation_packed_422() {
    let report = for_each_token_permutation(policy(), |perm| {
        let c = Converter::new();
        for &w in WIDTHS {
            let h = 2;
            let row = w.div_ceil(2) * 4;
            let src = make_bytes(row * h);
            let mut cpu = vec![0u8; w * h * 3];
            let mut got = vec![0u8; w * h * 3];
            for (name, source) in [
                ("yuyv", YuvSource::Yuyv(Plane::new(&src, row))),
                ("uyvy", YuvSource::Uyvy(Plane::new(&src, row))),
            ] {
                let reference = Converter::new();
                assert!(reference.set_backend(camconv::ConvertBackend::Cpu));
                let (fmt, cs) = (PackedFormat::Bgr24, ColorSpace::BT709_VIDEO);
                reference
                    .yuv_to_packed(&source, &mut cpu, w * 3, w, h as isize, fmt, cs)
                    .unwrap();
                c.yuv_to_packed(&source, &mut got, w * 3, w, h as isize, fmt, cs)
                    .unwrap();
                for (i, (&g, &r)) in got.iter().zip(&cpu).enumerate() {
                    assert!(
                        g.abs_diff(r) <= ACCELERATED_TOLERANCE,
                        "{name} w={w} byte {i} tier={perm}"
                    );
                }
            }
        }
    });
    std::eprintln!("packed 4:2:2: {report}");
}
