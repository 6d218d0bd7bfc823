//! Error types and result utilities for audio stream operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::Mode;

/// Convenience type alias for results that may contain [`AudioStreamError`].
pub type AudioStreamResult<T> = Result<T, AudioStreamError>;

/// Error types that can occur while operating an audio stream.
///
/// Caller mistakes (`InvalidArgument`, `WrongMode`, `Closed`) are always
/// detected before any backend call, so a failed operation never leaves the
/// stream partially applied. Backend-reported failures carry the backend's
/// own diagnostic text and are never retried internally.
#[derive(Error, Debug)]
pub enum AudioStreamError {
    /// Bad caller input: malformed ranges, wrong buffer shape, zero-valued
    /// descriptors, or an offset computation that would overflow.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend could not identify, decode, or create the stream.
    #[error("failed to open {}: {reason}", path.display())]
    OpenFailure {
        /// Path of the stream that could not be opened.
        path: PathBuf,
        /// Diagnostic text reported by the backend.
        reason: String,
    },

    /// The backend rejected a reposition request.
    #[error("seek to sample {offset} failed: {reason}")]
    SeekFailure {
        /// Absolute canonical-sample offset that was requested.
        offset: u64,
        /// Diagnostic text reported by the backend.
        reason: String,
    },

    /// The backend reported a failure while reading samples.
    #[error("backend read error: {0}")]
    BackendRead(String),

    /// The backend accepted fewer samples than were submitted.
    ///
    /// A truncated audio write corrupts file framing, so a short write is
    /// fatal and never retried.
    #[error("short write: backend accepted {written} of {submitted} samples")]
    PartialWrite {
        /// Samples the backend actually accepted.
        written: usize,
        /// Samples submitted in the call.
        submitted: usize,
    },

    /// A sample representation the canonical 32-bit format cannot carry.
    ///
    /// This is an integration error between a backend and the core, not a
    /// user-data error.
    #[error("unsupported sample type: {0}")]
    UnsupportedType(String),

    /// Engine or format-registry initialization failed.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// The session's backend handle has been released; only passive
    /// reflection of the last-known descriptors is still allowed.
    #[error("audio stream has been closed")]
    Closed,

    /// The operation requires the opposite I/O mode.
    #[error("stream is not open for {needed}")]
    WrongMode {
        /// Mode the operation needed the stream to be in.
        needed: Mode,
    },
}

impl AudioStreamError {
    /// Create an [`AudioStreamError::InvalidArgument`] error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Create an [`AudioStreamError::OpenFailure`] error.
    pub fn open_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OpenFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an [`AudioStreamError::SeekFailure`] error.
    pub fn seek_failure(offset: u64, reason: impl Into<String>) -> Self {
        Self::SeekFailure {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an [`AudioStreamError::BackendRead`] error.
    pub fn backend_read(reason: impl Into<String>) -> Self {
        Self::BackendRead(reason.into())
    }

    /// Check if this error indicates a caller mistake rather than a backend
    /// failure. Caller mistakes leave the stream fully usable.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::Closed | Self::WrongMode { .. }
        )
    }

    /// Check if this is a fatal error that should terminate use of the
    /// stream.
    pub fn is_fatal(&self) -> bool {
        !self.is_caller_error()
    }
}
