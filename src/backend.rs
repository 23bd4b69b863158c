//! Backend selection state and kernel resolution.
//!
//! A [`BackendManager`] holds the current selection plus one enable flag per
//! accelerated backend. Every conversion resolves the selection exactly once
//! at entry into a [`Kernel`], so changes made while a call is running only
//! affect calls that start afterwards.

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use archmage::ScalarToken;
#[allow(unused_imports)]
use archmage::SimdToken;

use crate::ConvertError;
use crate::cpu::{has_platform_accelerator, has_vector_isa};

/// Which implementation family runs a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConvertBackend {
    /// Best enabled backend the hardware supports, resolved per call.
    Auto = 0,
    /// Portable scalar reference kernels. Always available.
    Cpu = 1,
    /// x86-64 AVX2-class vector kernels.
    Avx2 = 2,
    /// AArch64 NEON kernels, the platform-accelerated tier.
    Neon = 3,
}

impl ConvertBackend {
    /// Concrete backends, in the order `Auto` prefers them.
    pub const PREFERENCE: [ConvertBackend; 3] = [Self::Neon, Self::Avx2, Self::Cpu];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        }
    }

    /// Whether the hardware can run this backend. `Auto` and `Cpu` always can.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Auto | Self::Cpu => true,
            Self::Avx2 => has_vector_isa(),
            Self::Neon => has_platform_accelerator(),
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Cpu,
            2 => Self::Avx2,
            3 => Self::Neon,
            _ => Self::Auto,
        }
    }
}

impl fmt::Display for ConvertBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConvertBackend {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" | "scalar" => Ok(Self::Cpu),
            "avx2" => Ok(Self::Avx2),
            "neon" => Ok(Self::Neon),
            _ => Err(ConvertError::InvalidArgument("unknown backend name")),
        }
    }
}

// ===========================================================================
// Resolved dispatch target
// ===========================================================================

/// A concrete backend together with the capability token proving it can run.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Kernel {
    Scalar(ScalarToken),
    #[cfg(target_arch = "x86_64")]
    Avx2(archmage::X64V3Token),
    #[cfg(target_arch = "aarch64")]
    Neon(archmage::NeonToken),
}

impl Kernel {
    pub(crate) fn summon(backend: ConvertBackend) -> Option<Self> {
        match backend {
            ConvertBackend::Cpu => Some(Self::Scalar(ScalarToken)),
            #[cfg(target_arch = "x86_64")]
            ConvertBackend::Avx2 => archmage::X64V3Token::summon().map(Self::Avx2),
            #[cfg(target_arch = "aarch64")]
            ConvertBackend::Neon => archmage::NeonToken::summon().map(Self::Neon),
            _ => None,
        }
    }

    pub(crate) fn backend(self) -> ConvertBackend {
        match self {
            Self::Scalar(_) => ConvertBackend::Cpu,
            #[cfg(target_arch = "x86_64")]
            Self::Avx2(_) => ConvertBackend::Avx2,
            #[cfg(target_arch = "aarch64")]
            Self::Neon(_) => ConvertBackend::Neon,
        }
    }
}

// ===========================================================================
// Manager
// ===========================================================================

/// Current backend selection and per-backend enable flags.
///
/// All state is atomic; readers never observe a torn value.
#[derive(Debug)]
pub struct BackendManager {
    selected: AtomicU8,
    avx2_enabled: AtomicBool,
    neon_enabled: AtomicBool,
}

impl Default for BackendManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendManager {
    /// Selection `Auto`, every backend enabled.
    pub const fn new() -> Self {
        Self {
            selected: AtomicU8::new(ConvertBackend::Auto as u8),
            avx2_enabled: AtomicBool::new(true),
            neon_enabled: AtomicBool::new(true),
        }
    }

    fn flag(&self, backend: ConvertBackend) -> Option<&AtomicBool> {
        match backend {
            ConvertBackend::Avx2 => Some(&self.avx2_enabled),
            ConvertBackend::Neon => Some(&self.neon_enabled),
            ConvertBackend::Auto | ConvertBackend::Cpu => None,
        }
    }

    /// The raw selection, which may be `Auto`.
    pub fn selected(&self) -> ConvertBackend {
        ConvertBackend::from_u8(self.selected.load(Ordering::Acquire))
    }

    /// The concrete backend a conversion started now would use. Never `Auto`.
    ///
    /// An explicit selection is returned as-is even if it has since been
    /// disabled; conversions report [`ConvertError::BackendUnavailable`] in
    /// that case.
    pub fn backend(&self) -> ConvertBackend {
        match self.selected() {
            ConvertBackend::Auto => self.auto_backend(),
            explicit => explicit,
        }
    }

    fn auto_backend(&self) -> ConvertBackend {
        ConvertBackend::PREFERENCE
            .into_iter()
            .find(|&b| self.is_usable(b))
            .unwrap_or(ConvertBackend::Cpu)
    }

    /// Supported by the hardware and currently enabled.
    pub fn is_usable(&self, backend: ConvertBackend) -> bool {
        backend.is_supported() && self.is_enabled(backend)
    }

    /// Select `backend`. Fails, leaving the selection unchanged, when an
    /// explicit backend is unsupported or disabled.
    pub fn set_backend(&self, backend: ConvertBackend) -> bool {
        if !self.is_usable(backend) {
            log::debug!("refusing backend {backend}: unsupported or disabled");
            return false;
        }
        let prev = ConvertBackend::from_u8(self.selected.swap(backend as u8, Ordering::AcqRel));
        if prev != backend {
            log::debug!("backend selection {prev} -> {backend}");
        }
        true
    }

    /// `Auto` and `Cpu` always report enabled.
    pub fn is_enabled(&self, backend: ConvertBackend) -> bool {
        self.flag(backend).is_none_or(|f| f.load(Ordering::Acquire))
    }

    /// Re-enable a backend. Returns whether it is now usable on this
    /// hardware. `Auto` is not a toggleable backend and reports `false`.
    pub fn enable(&self, backend: ConvertBackend) -> bool {
        match self.flag(backend) {
            Some(f) => {
                f.store(true, Ordering::Release);
                backend.is_supported()
            }
            None => backend == ConvertBackend::Cpu,
        }
    }

    /// Disable a backend so `Auto` skips it and explicit selection of it
    /// fails. `Cpu` cannot be disabled; the call is a no-op reporting
    /// success. `Auto` is not a toggleable backend and reports `false`.
    pub fn disable(&self, backend: ConvertBackend) -> bool {
        match self.flag(backend) {
            Some(f) => {
                if f.swap(false, Ordering::AcqRel) {
                    log::debug!("backend {backend} disabled");
                }
                true
            }
            None => backend == ConvertBackend::Cpu,
        }
    }

    /// Resolve the selection into a runnable kernel.
    ///
    /// `Auto` never fails: it walks the preference order and lands on the
    /// scalar kernel if nothing faster can be summoned. An explicit selection
    /// that cannot run yields [`ConvertError::BackendUnavailable`].
    pub(crate) fn kernel(&self) -> Result<Kernel, ConvertError> {
        match self.selected() {
            ConvertBackend::Auto => Ok(self.auto_kernel()),
            explicit => {
                if !self.is_usable(explicit) {
                    return Err(ConvertError::BackendUnavailable(explicit));
                }
                Kernel::summon(explicit).ok_or(ConvertError::BackendUnavailable(explicit))
            }
        }
    }

    fn auto_kernel(&self) -> Kernel {
        for backend in ConvertBackend::PREFERENCE {
            if !self.is_usable(backend) {
                continue;
            }
            match Kernel::summon(backend) {
                Some(k) => return k,
                None => log::debug!("{backend} token unavailable, trying next backend"),
            }
        }
        Kernel::Scalar(ScalarToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_manager_selects_auto() {
        let m = BackendManager::new();
        assert_eq!(m.selected(), ConvertBackend::Auto);
        assert_ne!(m.backend(), ConvertBackend::Auto);
        for b in [ConvertBackend::Cpu, ConvertBackend::Avx2, ConvertBackend::Neon] {
            assert!(m.is_enabled(b), "{b}");
        }
    }

    #[test]
    fn auto_and_cpu_always_selectable() {
        let m = BackendManager::new();
        assert!(m.set_backend(ConvertBackend::Cpu));
        assert_eq!(m.backend(), ConvertBackend::Cpu);
        assert!(m.set_backend(ConvertBackend::Auto));
        assert_eq!(m.selected(), ConvertBackend::Auto);
    }

    #[test]
    fn unsupported_selection_leaves_state() {
        let m = BackendManager::new();
        assert!(m.set_backend(ConvertBackend::Cpu));
        for b in [ConvertBackend::Avx2, ConvertBackend::Neon] {
            if !b.is_supported() {
                assert!(!m.set_backend(b), "{b}");
                assert_eq!(m.backend(), ConvertBackend::Cpu);
            }
        }
    }

    #[test]
    fn disabled_selection_fails() {
        let m = BackendManager::new();
        for b in [ConvertBackend::Avx2, ConvertBackend::Neon] {
            assert!(m.disable(b));
            assert!(!m.is_enabled(b));
            assert!(!m.set_backend(b), "{b}");
            assert_eq!(m.selected(), ConvertBackend::Auto);
        }
        assert_eq!(m.backend(), ConvertBackend::Cpu);
        assert!(matches!(m.kernel(), Ok(Kernel::Scalar(_))));
    }

    #[test]
    fn disabling_active_auto_backend_falls_to_next() {
        let m = BackendManager::new();
        let best = m.backend();
        if best == ConvertBackend::Cpu {
            return;
        }
        m.disable(best);
        let next = m.backend();
        assert_ne!(next, best);
        assert_eq!(next, ConvertBackend::Cpu);
        assert!(m.enable(best));
        assert_eq!(m.backend(), best);
    }

    #[test]
    fn cpu_cannot_be_disabled() {
        let m = BackendManager::new();
        assert!(m.disable(ConvertBackend::Cpu));
        assert!(m.is_enabled(ConvertBackend::Cpu));
        assert!(m.set_backend(ConvertBackend::Cpu));
    }

    #[test]
    fn auto_is_not_toggleable() {
        let m = BackendManager::new();
        assert!(!m.disable(ConvertBackend::Auto));
        assert!(!m.enable(ConvertBackend::Auto));
        assert!(m.is_enabled(ConvertBackend::Auto));
    }

    #[test]
    fn explicit_then_disabled_reports_unavailable() {
        let m = BackendManager::new();
        for b in [ConvertBackend::Avx2, ConvertBackend::Neon] {
            if !b.is_supported() {
                continue;
            }
            assert!(m.set_backend(b));
            m.disable(b);
            assert_eq!(m.backend(), b);
            assert_eq!(
                m.kernel().map(Kernel::backend),
                Err(ConvertError::BackendUnavailable(b))
            );
            m.enable(b);
            assert!(m.set_backend(ConvertBackend::Auto));
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("AVX2".parse::<ConvertBackend>(), Ok(ConvertBackend::Avx2));
        assert_eq!(" cpu ".parse::<ConvertBackend>(), Ok(ConvertBackend::Cpu));
        assert_eq!("neon".parse::<ConvertBackend>(), Ok(ConvertBackend::Neon));
        assert!("vimage".parse::<ConvertBackend>().is_err());
    }
}
