//! The boundary between the streaming core and codec/format engines.
//!
//! A backend is whatever actually decodes and encodes audio files. The core
//! talks to it through two object-safe traits: [`FormatBackend`] opens
//! streams and answers registry queries, and [`FormatHandle`] is one open
//! stream moving flat blocks of canonical samples. File framing, container
//! parsing and codec work all live behind this boundary; the core owns only
//! the in-memory canonical format (interleaved frames of signed 32-bit
//! fixed-point samples).
//!
//! [`memory::MemoryBackend`] is a self-contained reference implementation
//! backed by process memory.

pub mod memory;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;
use crate::error::{AudioStreamError, AudioStreamResult};
use crate::metadata::Comments;

/// I/O direction of an open stream, fixed for the stream's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// The stream decodes an existing file.
    Read,
    /// The stream encodes into a new file.
    Write,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "reading"),
            Self::Write => write!(f, "writing"),
        }
    }
}

/// Signal parameters of a stream: what the audio *is*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// Sample rate in Hz.
    pub rate: f64,
    /// Number of interleaved channels per frame.
    pub channels: u32,
    /// Meaningful bits per decoded sample.
    pub precision: u32,
    /// Total samples across all channels, when the backend can report it.
    pub length: Option<u64>,
}

impl SignalSpec {
    /// Create a spec with the given rate and channel count and a 32-bit
    /// precision, length unknown.
    pub fn new(rate: f64, channels: u32) -> Self {
        Self {
            rate,
            channels,
            precision: 32,
            length: None,
        }
    }

    /// Total addressable frames, when the stream length is known.
    pub fn frames(&self) -> Option<u64> {
        if self.channels == 0 {
            return None;
        }
        self.length.map(|samples| samples / u64::from(self.channels))
    }

    /// Stream duration in seconds, when the length is known.
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.rate <= 0.0 {
            return None;
        }
        self.frames().map(|frames| frames as f64 / self.rate)
    }

    /// Reject structurally invalid parameters before any backend call.
    pub fn validate(&self) -> AudioStreamResult<()> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(AudioStreamError::invalid_argument("illegal sample rate"));
        }
        if self.channels == 0 {
            return Err(AudioStreamError::invalid_argument(
                "illegal number of channels",
            ));
        }
        if self.precision == 0 {
            return Err(AudioStreamError::invalid_argument("illegal precision"));
        }
        Ok(())
    }
}

/// Encoding parameters of a stream: how the audio is *stored*.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingSpec {
    /// Encoding identifier.
    pub encoding: Encoding,
    /// Stored bits per sample; `None` lets the backend choose.
    pub bits_per_sample: Option<u32>,
    /// Compression amount, with encoding-specific meaning; `None` lets the
    /// backend choose.
    pub compression: Option<f64>,
}

impl EncodingSpec {
    /// Create a spec for the given encoding, leaving the rest to the
    /// backend.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            bits_per_sample: None,
            compression: None,
        }
    }

    /// Reject structurally invalid parameters before any backend call.
    pub fn validate(&self) -> AudioStreamResult<()> {
        if self.bits_per_sample == Some(0) {
            return Err(AudioStreamError::invalid_argument("illegal bits per sample"));
        }
        if let Some(compression) = self.compression {
            if !(compression.is_finite() && compression > 0.0) {
                return Err(AudioStreamError::invalid_argument("illegal compression"));
            }
        }
        Ok(())
    }
}

/// Capability the caller grants the backend for clobbering an existing file
/// at the write-open path.
#[derive(Clone, Default)]
pub enum OverwritePolicy {
    /// Never replace an existing file.
    #[default]
    Refuse,
    /// Replace an existing file without asking.
    Allow,
    /// Let the callback decide per path.
    Ask(Arc<dyn Fn(&Path) -> bool + Send + Sync>),
}

impl OverwritePolicy {
    /// Whether the backend may replace an existing file at `path`.
    pub fn permits(&self, path: &Path) -> bool {
        match self {
            Self::Refuse => false,
            Self::Allow => true,
            Self::Ask(decide) => decide(path),
        }
    }
}

impl fmt::Debug for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refuse => write!(f, "Refuse"),
            Self::Allow => write!(f, "Allow"),
            Self::Ask(_) => write!(f, "Ask(..)"),
        }
    }
}

/// A codec/format engine that can open streams.
///
/// Implementations report failures through [`AudioStreamError`] values
/// carrying their own diagnostic text; the core surfaces that text
/// verbatim and never retries.
pub trait FormatBackend: Send + Sync {
    /// One-time engine and format-registry initialization.
    ///
    /// Called exactly once, by the constructor of the engine context that
    /// owns this backend.
    fn init(&self) -> AudioStreamResult<()> {
        Ok(())
    }

    /// Open `path` for decoding.
    fn open_read(&self, path: &Path) -> AudioStreamResult<Box<dyn FormatHandle>>;

    /// Create `path` for encoding with the given parameters.
    ///
    /// `filetype` is a container-format hint (typically the file
    /// extension); `overwrite` is the caller's clobber capability.
    fn open_write(
        &self,
        path: &Path,
        signal: &SignalSpec,
        encoding: &EncodingSpec,
        filetype: Option<&str>,
        overwrite: &OverwritePolicy,
    ) -> AudioStreamResult<Box<dyn FormatHandle>>;

    /// Names of the container formats this backend can handle.
    fn format_names(&self) -> Vec<String>;
}

/// One open stream inside a backend.
///
/// Sample blocks cross this boundary as flat slices in canonical
/// interleaved order. A short count from [`read`](Self::read) means the
/// stream ended; a short count from [`write`](Self::write) is a fatal
/// condition the session turns into
/// [`PartialWrite`](AudioStreamError::PartialWrite).
pub trait FormatHandle: Send {
    /// Signal parameters, fixed at open time.
    fn signal(&self) -> &SignalSpec;

    /// Encoding parameters, fixed at open time.
    fn encoding(&self) -> &EncodingSpec;

    /// Container format name.
    fn filetype(&self) -> &str;

    /// Whether [`seek`](Self::seek) is supported on this stream.
    fn seekable(&self) -> bool;

    /// Read up to `buf.len()` canonical samples; returns how many were
    /// produced. Zero means end of stream.
    fn read(&mut self, buf: &mut [i32]) -> AudioStreamResult<usize>;

    /// Write `buf.len()` canonical samples; returns how many the backend
    /// accepted.
    fn write(&mut self, buf: &[i32]) -> AudioStreamResult<usize>;

    /// Reposition to an absolute canonical-sample offset.
    fn seek(&mut self, sample_offset: u64) -> AudioStreamResult<()>;

    /// Comment metadata attached to the stream.
    fn comments(&self) -> &Comments;

    /// Mutable access to the attached comment metadata.
    fn comments_mut(&mut self) -> &mut Comments;

    /// Flush and release the stream. Called once, before the handle is
    /// dropped.
    fn close(&mut self) -> AudioStreamResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_mode_display_matches_error_phrasing() {
        assert_eq!(Mode::Read.to_string(), "reading");
        assert_eq!(Mode::Write.to_string(), "writing");
    }

    #[test]
    fn test_signal_spec_frames_and_duration() {
        let spec = SignalSpec {
            rate: 8000.0,
            channels: 2,
            precision: 16,
            length: Some(16000),
        };
        assert_eq!(spec.frames(), Some(8000));
        assert_approx_eq!(spec.duration_seconds().unwrap(), 1.0);

        let unknown = SignalSpec::new(44100.0, 2);
        assert_eq!(unknown.frames(), None);
        assert_eq!(unknown.duration_seconds(), None);
    }

    #[test]
    fn test_descriptor_validation() {
        assert!(SignalSpec::new(44100.0, 2).validate().is_ok());
        assert!(SignalSpec::new(0.0, 2).validate().is_err());
        assert!(SignalSpec::new(f64::NAN, 2).validate().is_err());
        assert!(SignalSpec::new(44100.0, 0).validate().is_err());

        let mut enc = EncodingSpec::new(Encoding::Sign2);
        assert!(enc.validate().is_ok());
        enc.bits_per_sample = Some(0);
        assert!(enc.validate().is_err());
        enc.bits_per_sample = Some(16);
        enc.compression = Some(-1.0);
        assert!(enc.validate().is_err());
    }

    #[test]
    fn test_overwrite_policy() {
        let path = Path::new("out.wav");
        assert!(!OverwritePolicy::Refuse.permits(path));
        assert!(OverwritePolicy::Allow.permits(path));
        let ask = OverwritePolicy::Ask(Arc::new(|p: &Path| {
            p.extension().is_some_and(|e| e == "wav")
        }));
        assert!(ask.permits(path));
        assert!(!ask.permits(Path::new("out.flac")));
    }
}
