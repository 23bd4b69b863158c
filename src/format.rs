/// Packed RGB-family output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedFormat {
    Rgb24,
    Bgr24,
    Rgba32,
    Bgra32,
}

impl PackedFormat {
    pub const ALL: [Self; 4] = [Self::Rgb24, Self::Bgr24, Self::Rgba32, Self::Bgra32];

    /// Bytes per pixel.
    pub const fn bpp(self) -> usize {
        match self {
            Self::Rgb24 | Self::Bgr24 => 3,
            Self::Rgba32 | Self::Bgra32 => 4,
        }
    }

    /// Blue is stored first.
    pub const fn is_bgr(self) -> bool {
        matches!(self, Self::Bgr24 | Self::Bgra32)
    }

    pub const fn has_alpha(self) -> bool {
        self.bpp() == 4
    }
}
