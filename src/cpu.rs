//! Runtime capability probing.
//!
//! Both queries run detection once and cache the answer for the life of the
//! process.

use std::sync::OnceLock;

#[allow(unused_imports)]
use archmage::SimdToken;

#[derive(Debug, Clone, Copy)]
struct Capabilities {
    vector_isa: bool,
    platform_accelerator: bool,
}

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

fn detect() -> Capabilities {
    let caps = Capabilities {
        vector_isa: detect_vector_isa(),
        platform_accelerator: detect_platform_accelerator(),
    };
    log::debug!(
        "camconv capabilities: avx2={} neon={}",
        caps.vector_isa,
        caps.platform_accelerator
    );
    caps
}

#[cfg(target_arch = "x86_64")]
fn detect_vector_isa() -> bool {
    archmage::X64V3Token::summon().is_some()
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_vector_isa() -> bool {
    false
}

#[cfg(target_arch = "aarch64")]
fn detect_platform_accelerator() -> bool {
    archmage::NeonToken::summon().is_some()
}

#[cfg(not(target_arch = "aarch64"))]
fn detect_platform_accelerator() -> bool {
    false
}

/// True when the AVX2-class vector backend (x86-64-v3) can run on this CPU.
pub fn has_vector_isa() -> bool {
    CAPABILITIES.get_or_init(detect).vector_isa
}

/// True when the platform-accelerated backend (AArch64 NEON) can run on this
/// CPU.
pub fn has_platform_accelerator() -> bool {
    CAPABILITIES.get_or_init(detect).platform_accelerator
}
