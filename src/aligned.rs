//! 32-byte aligned scratch allocation with outstanding-byte accounting.
//!
//! Buffers are backed by a `Vec` of 32-byte blocks, so alignment comes from
//! the element type and no raw allocation is needed. Each buffer remembers
//! the allocator generation it was created under; [`AlignedAllocator::reset`]
//! bumps the generation so buffers from before the reset stop affecting the
//! counter when they are dropped.

use core::fmt;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use bytemuck::{Pod, Zeroable};

use crate::ConvertError;

/// Alignment of every buffer handed out by [`AlignedAllocator`].
pub const ALIGNMENT: usize = 32;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(32))]
struct Block([u8; ALIGNMENT]);

#[derive(Debug, Default)]
struct Ledger {
    outstanding: AtomicUsize,
    generation: AtomicU64,
    limit: Option<usize>,
}

/// Allocator producing zeroed, 32-byte aligned byte buffers.
///
/// `allocate`, buffer drop and `size` are safe to use from many threads at
/// once. `reset` is a teardown/diagnostic operation: callers must make sure
/// no other thread is allocating or releasing while it runs.
#[derive(Debug, Default, Clone)]
pub struct AlignedAllocator {
    ledger: Arc<Ledger>,
}

impl AlignedAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that refuses any request which would take its
    /// outstanding bytes past `limit`.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ledger: Arc::new(Ledger {
                limit: Some(limit),
                ..Ledger::default()
            }),
        }
    }

    /// The byte cap given to [`with_limit`](Self::with_limit), if any.
    pub fn limit(&self) -> Option<usize> {
        self.ledger.limit
    }

    /// Allocate `len` zeroed bytes aligned to [`ALIGNMENT`].
    ///
    /// Never panics on exhaustion; returns
    /// [`ConvertError::AllocationFailure`] instead, also when the request
    /// would exceed the allocator's limit.
    pub fn allocate(&self, len: usize) -> Result<AlignedBuf, ConvertError> {
        let failure = ConvertError::AllocationFailure { bytes: len };
        let blocks = len.div_ceil(ALIGNMENT);
        let mut storage: Vec<Block> = Vec::new();
        storage.try_reserve_exact(blocks).map_err(|_| failure)?;
        let limit = self.ledger.limit.unwrap_or(usize::MAX);
        self.ledger
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                v.checked_add(len).filter(|&next| next <= limit)
            })
            .map_err(|_| failure)?;
        storage.resize(blocks, Block::zeroed());
        Ok(AlignedBuf {
            storage,
            len,
            generation: self.ledger.generation.load(Ordering::Acquire),
            ledger: Arc::clone(&self.ledger),
        })
    }

    /// Bytes held by live buffers allocated since the last reset.
    pub fn size(&self) -> usize {
        self.ledger.outstanding.load(Ordering::Acquire)
    }

    /// Forget every outstanding allocation and zero the counter.
    ///
    /// Buffers obtained before the reset stay valid memory but no longer
    /// count toward [`size`](Self::size). Repeated resets are harmless.
    pub fn reset(&self) {
        self.ledger.generation.fetch_add(1, Ordering::AcqRel);
        self.ledger.outstanding.store(0, Ordering::Release);
    }
}

/// An owned, zero-initialized, 32-byte aligned byte buffer.
pub struct AlignedBuf {
    storage: Vec<Block>,
    len: usize,
    generation: u64,
    ledger: Arc<Ledger>,
}

impl AlignedBuf {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.storage)[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.storage)[..self.len]
    }
}

impl core::ops::Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl core::ops::DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("len", &self.len)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        if self.ledger.generation.load(Ordering::Acquire) != self.generation {
            return;
        }
        let len = self.len;
        let _ = self
            .ledger
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_sub(len))
            });
    }
}

// ===========================================================================
// Process-wide instance
// ===========================================================================

static SHARED: OnceLock<AlignedAllocator> = OnceLock::new();

/// The lazily created process-wide allocator.
pub fn shared_allocator() -> AlignedAllocator {
    SHARED.get_or_init(AlignedAllocator::new).clone()
}

/// [`AlignedAllocator::reset`] on the shared instance. Same caller
/// obligations apply.
pub fn reset_shared_allocator() {
    SHARED.get_or_init(AlignedAllocator::new).reset();
}

/// Outstanding bytes on the shared instance.
pub fn allocator_size() -> usize {
    SHARED.get_or_init(AlignedAllocator::new).size()
}
