//! Single-pixel YUV → RGB math in Q8 fixed point.
//!
//! Every bulk kernel reproduces exactly this arithmetic:
//!
//! ```text
//! c = Y - y_offset      d = U - 128      e = V - 128
//! R = clamp((cy*c + rv*e         + 128) >> 8)
//! G = clamp((cy*c - gu*d - gv*e  + 128) >> 8)
//! B = clamp((cy*c + bu*d         + 128) >> 8)
//! ```

/// Color matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorStandard {
    /// ITU-R BT.601 (SD).
    #[default]
    Bt601,
    /// ITU-R BT.709 (HD).
    Bt709,
}

/// Sample range of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorRange {
    /// Luma 16..=235, chroma 16..=240.
    #[default]
    Video,
    /// All channels 0..=255.
    Full,
}

/// A (standard, range) pair. Defaults to BT.601 video range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorSpace {
    pub standard: ColorStandard,
    pub range: ColorRange,
}

impl ColorSpace {
    pub const BT601_VIDEO: Self = Self::new(ColorStandard::Bt601, ColorRange::Video);
    pub const BT709_VIDEO: Self = Self::new(ColorStandard::Bt709, ColorRange::Video);
    pub const BT601_FULL: Self = Self::new(ColorStandard::Bt601, ColorRange::Full);
    pub const BT709_FULL: Self = Self::new(ColorStandard::Bt709, ColorRange::Full);

    pub const ALL: [Self; 4] = [
        Self::BT601_VIDEO,
        Self::BT709_VIDEO,
        Self::BT601_FULL,
        Self::BT709_FULL,
    ];

    pub const fn new(standard: ColorStandard, range: ColorRange) -> Self {
        Self { standard, range }
    }

    pub(crate) const fn coefficients(self) -> &'static Coefficients {
        match (self.standard, self.range) {
            (ColorStandard::Bt601, ColorRange::Video) => &BT601_VIDEO,
            (ColorStandard::Bt709, ColorRange::Video) => &BT709_VIDEO,
            (ColorStandard::Bt601, ColorRange::Full) => &BT601_FULL,
            (ColorStandard::Bt709, ColorRange::Full) => &BT709_FULL,
        }
    }
}

/// Q8 matrix coefficients. Green terms are subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Coefficients {
    pub y_offset: i32,
    pub cy: i32,
    pub rv: i32,
    pub gu: i32,
    pub gv: i32,
    pub bu: i32,
}

pub(crate) const BT601_VIDEO: Coefficients = Coefficients {
    y_offset: 16,
    cy: 298,
    rv: 409,
    gu: 100,
    gv: 208,
    bu: 516,
};

pub(crate) const BT709_VIDEO: Coefficients = Coefficients {
    y_offset: 16,
    cy: 298,
    rv: 459,
    gu: 55,
    gv: 136,
    bu: 541,
};

pub(crate) const BT601_FULL: Coefficients = Coefficients {
    y_offset: 0,
    cy: 256,
    rv: 359,
    gu: 88,
    gv: 183,
    bu: 454,
};

pub(crate) const BT709_FULL: Coefficients = Coefficients {
    y_offset: 0,
    cy: 256,
    rv: 403,
    gu: 48,
    gv: 120,
    bu: 475,
};

/// Chroma contribution of one (U, V) pair, shared by every luma sample in
/// its block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChromaTerms {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Coefficients {
    #[inline(always)]
    pub(crate) fn chroma(&self, u: u8, v: u8) -> ChromaTerms {
        let d = u as i32 - 128;
        let e = v as i32 - 128;
        ChromaTerms {
            r: self.rv * e + 128,
            g: -(self.gu * d) - self.gv * e + 128,
            b: self.bu * d + 128,
        }
    }

    #[inline(always)]
    pub(crate) fn apply(&self, y: u8, t: ChromaTerms) -> [u8; 3] {
        let l = self.cy * (y as i32 - self.y_offset);
        [
            clamp_q8(l + t.r),
            clamp_q8(l + t.g),
            clamp_q8(l + t.b),
        ]
    }

    #[inline(always)]
    pub(crate) fn to_rgb(&self, y: u8, u: u8, v: u8) -> [u8; 3] {
        self.apply(y, self.chroma(u, v))
    }
}

#[inline(always)]
fn clamp_q8(v: i32) -> u8 {
    (v >> 8).clamp(0, 255) as u8
}

/// Convert one sample under the given matrix and range. Returns `[r, g, b]`.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8, standard: ColorStandard, range: ColorRange) -> [u8; 3] {
    ColorSpace::new(standard, range).coefficients().to_rgb(y, u, v)
}

/// BT.601, video range.
pub fn yuv_to_rgb_601v(y: u8, u: u8, v: u8) -> [u8; 3] {
    BT601_VIDEO.to_rgb(y, u, v)
}

/// BT.709, video range.
pub fn yuv_to_rgb_709v(y: u8, u: u8, v: u8) -> [u8; 3] {
    BT709_VIDEO.to_rgb(y, u, v)
}

/// BT.601, full range.
pub fn yuv_to_rgb_601f(y: u8, u: u8, v: u8) -> [u8; 3] {
    BT601_FULL.to_rgb(y, u, v)
}

/// BT.709, full range.
pub fn yuv_to_rgb_709f(y: u8, u: u8, v: u8) -> [u8; 3] {
    BT709_FULL.to_rgb(y, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Float reference for the same matrices, used to bound the fixed-point error.
    fn float_ref(y: u8, u: u8, v: u8, cs: ColorSpace) -> [f64; 3] {
        let (kr, kb) = match cs.standard {
            ColorStandard::Bt601 => (0.299, 0.114),
            ColorStandard::Bt709 => (0.2126, 0.0722),
        };
        let kg = 1.0 - kr - kb;
        let (yf, cscale) = match cs.range {
            ColorRange::Video => ((y as f64 - 16.0) * 255.0 / 219.0, 255.0 / 224.0),
            ColorRange::Full => (y as f64, 1.0),
        };
        let pb = (u as f64 - 128.0) * cscale;
        let pr = (v as f64 - 128.0) * cscale;
        let r = yf + 2.0 * (1.0 - kr) * pr;
        let b = yf + 2.0 * (1.0 - kb) * pb;
        let g = (yf - kr * r - kb * b) / kg;
        [r, g, b].map(|c| c.round().clamp(0.0, 255.0))
    }

    #[test]
    fn video_black_and_white() {
        for f in [yuv_to_rgb_601v, yuv_to_rgb_709v] {
            assert_eq!(f(16, 128, 128), [0, 0, 0]);
            assert_eq!(f(235, 128, 128), [255, 255, 255]);
            assert_eq!(f(0, 128, 128), [0, 0, 0]);
            assert_eq!(f(255, 128, 128), [255, 255, 255]);
        }
    }

    #[test]
    fn full_range_extremes() {
        for f in [yuv_to_rgb_601f, yuv_to_rgb_709f] {
            assert_eq!(f(0, 128, 128), [0, 0, 0]);
            assert_eq!(f(255, 128, 128), [255, 255, 255]);
            assert_eq!(f(128, 128, 128), [128, 128, 128]);
        }
    }

    #[test]
    fn mid_gray_video() {
        // (126-16)*298 = 32780, +128 >> 8 = 128
        assert_eq!(yuv_to_rgb_601v(126, 128, 128), [128, 128, 128]);
    }

    #[test]
    fn bt601_video_red() {
        let [r, g, b] = yuv_to_rgb_601v(81, 90, 240);
        assert!(r >= 250, "r={r}");
        assert!(g <= 5, "g={g}");
        assert!(b <= 5, "b={b}");
    }

    #[test]
    fn named_match_generic() {
        use ColorRange::*;
        use ColorStandard::*;
        for y in [0u8, 16, 100, 235, 255] {
            for u in [0u8, 128, 255] {
                for v in [0u8, 128, 255] {
                    assert_eq!(yuv_to_rgb_601v(y, u, v), yuv_to_rgb(y, u, v, Bt601, Video));
                    assert_eq!(yuv_to_rgb_709v(y, u, v), yuv_to_rgb(y, u, v, Bt709, Video));
                    assert_eq!(yuv_to_rgb_601f(y, u, v), yuv_to_rgb(y, u, v, Bt601, Full));
                    assert_eq!(yuv_to_rgb_709f(y, u, v), yuv_to_rgb(y, u, v, Bt709, Full));
                }
            }
        }
    }

    #[test]
    fn boundary_samples_track_float_reference() {
        for cs in ColorSpace::ALL {
            for y in [0u8, 16, 235, 255] {
                for u in [0u8, 128, 255] {
                    for v in [0u8, 128, 255] {
                        let got = cs.coefficients().to_rgb(y, u, v);
                        let want = float_ref(y, u, v, cs);
                        for c in 0..3 {
                            let diff = (got[c] as f64 - want[c]).abs();
                            assert!(
                                diff <= 3.0,
                                "{cs:?} yuv=({y},{u},{v}) ch={c} got={} want={}",
                                got[c],
                                want[c]
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn chroma_terms_are_reusable() {
        let c = &BT709_VIDEO;
        let t = c.chroma(60, 200);
        for y in [16u8, 80, 200] {
            assert_eq!(c.apply(y, t), c.to_rgb(y, 60, 200));
        }
    }

    #[test]
    fn default_is_bt601_video() {
        assert_eq!(ColorSpace::default(), ColorSpace::BT601_VIDEO);
    }
}
