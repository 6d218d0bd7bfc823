//! Stream sessions: one open backend handle plus offset bookkeeping.
//!
//! An [`AudioStream`] owns exactly one open backend stream and orchestrates
//! the read/seek/write state machine around it. Reads hand back canonical
//! sample blocks and advance the frame offset by what was actually
//! transferred; writes route native-typed blocks through the
//! [codec](crate::codec) and advance the offset by what the backend
//! accepted. Every call is synchronous and blocks until the backend is
//! done.
//!
//! Sessions are created through [`EngineContext`](crate::EngineContext) and
//! live until [`close`](AudioStream::close) or drop. A closed session keeps
//! answering descriptor queries from the parameters cached at open time but
//! refuses any further I/O.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use audio_stream::{EngineContext, FrameSelection, MemoryBackend};
//!
//! # fn main() -> audio_stream::AudioStreamResult<()> {
//! let backend = Arc::new(MemoryBackend::new());
//! backend.insert("tone.mem", 8000.0, 1, vec![0, 1 << 24, 0, -(1 << 24)]);
//!
//! let ctx = EngineContext::initialize(backend)?;
//! let mut stream = ctx.open_read("tone.mem")?;
//! let block = stream.read(2)?.unwrap();
//! assert_eq!(block.dim(), (2, 1));
//! assert_eq!(stream.offset(), 2);
//!
//! let last = stream.read_at(FrameSelection::Index(0))?.unwrap();
//! assert_eq!(last[[0, 0]], -(1 << 24));
//! stream.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::{debug, warn};

use crate::backend::{EncodingSpec, FormatHandle, Mode, OverwritePolicy, SignalSpec};
use crate::codec::{self, NativeSamples};
use crate::encoding::Encoding;
use crate::error::{AudioStreamError, AudioStreamResult};
use crate::select::FrameSelection;

/// Parameters for opening a stream for writing.
///
/// Defaults are a 48 kHz stereo signal at 16-bit precision, signed PCM,
/// with bits-per-sample and compression left to the backend and
/// overwriting refused. All numeric setters are validated before any
/// backend call.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    signal: SignalSpec,
    encoding: EncodingSpec,
    filetype: Option<String>,
    overwrite: OverwritePolicy,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            signal: SignalSpec {
                rate: 48_000.0,
                channels: 2,
                precision: 16,
                length: None,
            },
            encoding: EncodingSpec::new(Encoding::Sign2),
            filetype: None,
            overwrite: OverwritePolicy::Refuse,
        }
    }
}

impl WriteOptions {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive options from an existing open session, copying its signal and
    /// encoding descriptors and filetype but never its length.
    pub fn from_template(template: &AudioStream) -> AudioStreamResult<Self> {
        if !template.is_open() {
            return Err(AudioStreamError::Closed);
        }
        Ok(Self {
            signal: SignalSpec {
                length: None,
                ..template.signal.clone()
            },
            encoding: template.encoding.clone(),
            filetype: Some(template.filetype.clone()),
            overwrite: OverwritePolicy::Refuse,
        })
    }

    /// Set the sample rate in Hz.
    pub fn rate(mut self, rate: f64) -> Self {
        self.signal.rate = rate;
        self
    }

    /// Set the channel count.
    pub fn channels(mut self, channels: u32) -> Self {
        self.signal.channels = channels;
        self
    }

    /// Set the signal precision in bits.
    pub fn precision(mut self, precision: u32) -> Self {
        self.signal.precision = precision;
        self
    }

    /// Set the stored bits per sample.
    pub fn bits_per_sample(mut self, bits: u32) -> Self {
        self.encoding.bits_per_sample = Some(bits);
        self
    }

    /// Set the target encoding.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding.encoding = encoding;
        self
    }

    /// Set the compression amount (encoding-specific meaning).
    pub fn compression(mut self, compression: f64) -> Self {
        self.encoding.compression = Some(compression);
        self
    }

    /// Set the container-format hint.
    pub fn filetype(mut self, filetype: impl Into<String>) -> Self {
        self.filetype = Some(filetype.into());
        self
    }

    /// Set the overwrite capability handed to the backend.
    pub fn overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Reject structurally invalid descriptors.
    pub fn validate(&self) -> AudioStreamResult<()> {
        self.signal.validate()?;
        self.encoding.validate()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (SignalSpec, EncodingSpec, Option<String>, OverwritePolicy) {
        (self.signal, self.encoding, self.filetype, self.overwrite)
    }
}

/// One open audio stream and its bookkeeping.
///
/// See the [module documentation](self) for the overall model.
pub struct AudioStream {
    handle: Option<Box<dyn FormatHandle>>,
    mode: Mode,
    path: PathBuf,
    filetype: String,
    seekable: bool,
    signal: SignalSpec,
    encoding: EncodingSpec,
    offset: u64,
    clips: u64,
}

impl AudioStream {
    pub(crate) fn new(handle: Box<dyn FormatHandle>, mode: Mode, path: PathBuf) -> Self {
        let signal = handle.signal().clone();
        let encoding = handle.encoding().clone();
        let filetype = handle.filetype().to_string();
        let seekable = handle.seekable();
        debug!(path = %path.display(), %mode, "opened audio stream");
        Self {
            handle: Some(handle),
            mode,
            path,
            filetype,
            seekable,
            signal,
            encoding,
            offset: 0,
            clips: 0,
        }
    }

    /// Read up to `frames` frames from the current offset.
    ///
    /// Returns `Ok(None)` for a zero-frame request and at end of stream;
    /// otherwise the block holds exactly the frames obtained, which is
    /// fewer than requested only when the stream ended mid-request (a
    /// short read). The offset advances by the frames actually read.
    pub fn read(&mut self, frames: usize) -> AudioStreamResult<Option<Array2<i32>>> {
        self.ensure_live(Mode::Read)?;
        if frames == 0 {
            return Ok(None);
        }
        let channels = self.signal.channels as usize;
        let total = frames.checked_mul(channels).ok_or_else(|| {
            AudioStreamError::invalid_argument("requested sample count would overflow")
        })?;

        let mut buf = vec![0i32; total];
        let Some(handle) = self.handle.as_mut() else {
            return Err(AudioStreamError::Closed);
        };
        let n = handle.read(&mut buf)?;

        if n % channels != 0 {
            warn!(
                samples = n,
                channels, "sample count from backend is not a multiple of the channel count"
            );
        }
        let frames_read = n / channels;
        self.offset += frames_read as u64;
        if frames_read == 0 {
            return Ok(None);
        }

        buf.truncate(frames_read * channels);
        let block = Array2::from_shape_vec((frames_read, channels), buf)
            .map_err(|err| AudioStreamError::backend_read(err.to_string()))?;
        Ok(Some(block))
    }

    /// Read the frames named by a [`FrameSelection`], repositioning first
    /// when the selection starts away from the current offset.
    pub fn read_at(
        &mut self,
        selection: impl Into<FrameSelection>,
    ) -> AudioStreamResult<Option<Array2<i32>>> {
        self.ensure_live(Mode::Read)?;
        let resolved = selection
            .into()
            .resolve(self.offset, self.total_frames())?;
        if resolved.start != self.offset {
            self.seek(resolved.start)?;
        }
        let frames = usize::try_from(resolved.frames).map_err(|_| {
            AudioStreamError::invalid_argument("resolved frame count out of range")
        })?;
        self.read(frames)
    }

    /// Reposition so the next read starts at `frame`.
    ///
    /// Targets past the end of a stream of known length clamp to the end.
    /// Seeking to the current offset is a no-op that issues no backend
    /// call.
    pub fn seek(&mut self, frame: u64) -> AudioStreamResult<()> {
        self.ensure_live(Mode::Read)?;
        let channels = u64::from(self.signal.channels);
        frame.checked_mul(channels).ok_or_else(|| {
            AudioStreamError::invalid_argument("seek target would overflow the sample range")
        })?;
        let frame = match self.total_frames() {
            Some(total) => frame.min(total),
            None => frame,
        };
        if frame == self.offset {
            return Ok(());
        }
        let Some(handle) = self.handle.as_mut() else {
            return Err(AudioStreamError::Closed);
        };
        handle.seek(frame * channels)?;
        self.offset = frame;
        Ok(())
    }

    /// Convert (when needed) and write a block of samples.
    ///
    /// The block must be shaped frames-by-channels; mono data may be a
    /// flat `Array1`. Non-canonical kinds pass through the codec and any
    /// clipping accumulates on [`clips`](Self::clips). Returns the number
    /// of frames written; a backend accepting fewer samples than submitted
    /// is a fatal [`PartialWrite`](AudioStreamError::PartialWrite).
    pub fn write(&mut self, samples: impl Into<NativeSamples>) -> AudioStreamResult<usize> {
        self.ensure_live(Mode::Write)?;
        let native = samples.into();
        let channels = self.signal.channels as usize;
        if native.channels() != channels {
            return Err(AudioStreamError::invalid_argument(format!(
                "expected frames-by-{channels} audio data, got frames-by-{}",
                native.channels()
            )));
        }

        let (block, clips) = codec::encode(native);
        self.clips += clips;
        let total = block.len();

        let contiguous;
        let flat: &[i32] = match block.as_slice() {
            Some(slice) => slice,
            None => {
                contiguous = block.iter().copied().collect::<Vec<_>>();
                &contiguous
            }
        };

        let Some(handle) = self.handle.as_mut() else {
            return Err(AudioStreamError::Closed);
        };
        let n = handle.write(flat)?;
        self.offset += (n / channels) as u64;
        if n != total {
            return Err(AudioStreamError::PartialWrite {
                written: n,
                submitted: total,
            });
        }
        Ok(n / channels)
    }

    /// Release the backend handle and reset the offset.
    ///
    /// Idempotent: closing an already-closed session is a no-op.
    /// Descriptor accessors keep reflecting the values cached at open.
    pub fn close(&mut self) -> AudioStreamResult<()> {
        if let Some(mut handle) = self.handle.take() {
            debug!(path = %self.path.display(), "closing audio stream");
            handle.close()?;
        }
        self.offset = 0;
        Ok(())
    }

    fn ensure_live(&self, needed: Mode) -> AudioStreamResult<()> {
        if self.handle.is_none() {
            return Err(AudioStreamError::Closed);
        }
        if self.mode != needed {
            return Err(AudioStreamError::WrongMode { needed });
        }
        Ok(())
    }

    // --- descriptors, valid for the session's whole lifetime ---

    /// I/O direction the session was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the backend handle is still held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the session is open for reading.
    pub fn is_readable(&self) -> bool {
        self.is_open() && self.mode == Mode::Read
    }

    /// Whether the session is open for writing.
    pub fn is_writable(&self) -> bool {
        self.is_open() && self.mode == Mode::Write
    }

    /// Whether the underlying stream supports repositioning.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Channel count.
    pub fn channels(&self) -> u32 {
        self.signal.channels
    }

    /// Sample rate in Hz.
    pub fn rate(&self) -> f64 {
        self.signal.rate
    }

    /// Signal precision in bits.
    pub fn precision(&self) -> u32 {
        self.signal.precision
    }

    /// Stored bits per sample, when the backend reported them.
    pub fn bits_per_sample(&self) -> Option<u32> {
        self.encoding.bits_per_sample
    }

    /// Encoding identifier.
    pub fn encoding(&self) -> Encoding {
        self.encoding.encoding
    }

    /// Compression amount, when the backend reported one.
    pub fn compression(&self) -> Option<f64> {
        self.encoding.compression
    }

    /// Total samples across all channels, when known.
    pub fn length(&self) -> Option<u64> {
        self.signal.length
    }

    /// Total addressable frames, when known.
    pub fn total_frames(&self) -> Option<u64> {
        self.signal.frames()
    }

    /// Stream duration in seconds, when the length is known.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.signal.duration_seconds()
    }

    /// Frame index of the next read (Read mode) or frames written so far
    /// (Write mode).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Cumulative count of samples clamped during float conversion.
    pub fn clips(&self) -> u64 {
        self.clips
    }

    /// Path the session was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container format name.
    pub fn filetype(&self) -> &str {
        &self.filetype
    }

    // --- comment metadata, delegated to the backend handle ---

    /// Append a raw comment entry.
    pub fn append_comment(&mut self, comment: &str) -> AudioStreamResult<()> {
        let handle = self.handle.as_mut().ok_or(AudioStreamError::Closed)?;
        handle.comments_mut().append(comment);
        Ok(())
    }

    /// Store `value` under `id`, returning a replaced previous value.
    pub fn set_metadata(&mut self, id: &str, value: &str) -> AudioStreamResult<Option<String>> {
        let handle = self.handle.as_mut().ok_or(AudioStreamError::Closed)?;
        handle.comments_mut().set(id, value)
    }

    /// Look up the metadata value stored under `id`.
    ///
    /// `None` when absent, and always `None` on a closed session.
    pub fn metadata(&self, id: &str) -> Option<String> {
        self.handle
            .as_ref()
            .and_then(|handle| handle.comments().get(id).map(String::from))
    }

    /// Copy out all comment entries; empty on a closed session.
    pub fn comments(&self) -> Vec<String> {
        self.handle
            .as_ref()
            .map(|handle| handle.comments().to_vec())
            .unwrap_or_default()
    }

    /// Delete every comment entry; a no-op on a closed session.
    pub fn delete_comments(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.comments_mut().delete_all();
        }
    }
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .field("signal", &self.signal)
            .field("offset", &self.offset)
            .field("clips", &self.clips)
            .finish()
    }
}
