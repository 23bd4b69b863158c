use core::fmt;

use crate::backend::ConvertBackend;

/// Error returned by every fallible conversion and allocation entry point.
///
/// A conversion that returns an error has not written to its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertError {
    /// Empty buffer, zero dimension, stride below the row size, a slice too
    /// short for the declared geometry, or an unusable channel map.
    InvalidArgument(&'static str),
    /// An explicitly selected backend is not supported by this CPU or has
    /// been disabled.
    BackendUnavailable(ConvertBackend),
    /// The aligned allocator could not satisfy a request.
    AllocationFailure { bytes: usize },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::BackendUnavailable(b) => {
                write!(f, "backend {b} is not supported or is disabled")
            }
            Self::AllocationFailure { bytes } => {
                write!(f, "failed to allocate {bytes} aligned bytes")
            }
        }
    }
}

impl std::error::Error for ConvertError {}
