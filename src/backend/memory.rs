//! In-memory reference backend.
//!
//! Stores named streams of canonical samples behind a shared map. Useful as
//! a scratch target, as the test double for session logic, and as the
//! smallest complete example of the backend contract. There is no container
//! framing: what you write is exactly what a later open reads back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{
    EncodingSpec, FormatBackend, FormatHandle, Mode, OverwritePolicy, SignalSpec,
};
use crate::encoding::Encoding;
use crate::error::{AudioStreamError, AudioStreamResult};
use crate::metadata::Comments;

/// One stored stream: descriptors, canonical samples, and metadata.
#[derive(Debug, Clone)]
struct StoredStream {
    signal: SignalSpec,
    encoding: EncodingSpec,
    filetype: String,
    samples: Vec<i32>,
    comments: Comments,
}

/// Operation counters, mostly useful when the backend doubles as a test
/// observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryMetrics {
    /// Calls to [`FormatBackend::init`].
    pub init_calls: u64,
    /// Backend-level read calls.
    pub reads: u64,
    /// Backend-level write calls.
    pub writes: u64,
    /// Backend-level seek calls.
    pub seeks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    init_calls: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    seeks: AtomicU64,
}

/// A [`FormatBackend`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    streams: Arc<Mutex<HashMap<PathBuf, StoredStream>>>,
    counters: Arc<Counters>,
}

impl MemoryBackend {
    /// Create a backend with no stored streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a readable stream of canonical samples.
    ///
    /// The signal length is set from the sample count; rate and channel
    /// count are taken as given, precision is the full canonical width.
    pub fn insert(&self, path: impl Into<PathBuf>, rate: f64, channels: u32, samples: Vec<i32>) {
        let signal = SignalSpec {
            rate,
            channels,
            precision: 32,
            length: Some(samples.len() as u64),
        };
        let mut encoding = EncodingSpec::new(Encoding::Sign2);
        encoding.bits_per_sample = Some(32);
        self.insert_with(path, signal, encoding, samples);
    }

    /// Seed a readable stream with full control over the descriptors.
    ///
    /// Pass a signal with `length: None` to simulate a backend that cannot
    /// report stream length up front.
    pub fn insert_with(
        &self,
        path: impl Into<PathBuf>,
        signal: SignalSpec,
        encoding: EncodingSpec,
        samples: Vec<i32>,
    ) {
        self.lock().insert(
            path.into(),
            StoredStream {
                signal,
                encoding,
                filetype: "mem".to_string(),
                samples,
                comments: Comments::new(),
            },
        );
    }

    /// Whether a stream is stored under `path`.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.lock().contains_key(path.as_ref())
    }

    /// Snapshot of the canonical samples stored under `path`.
    pub fn samples(&self, path: impl AsRef<Path>) -> Option<Vec<i32>> {
        self.lock().get(path.as_ref()).map(|s| s.samples.clone())
    }

    /// Snapshot of the comments stored under `path`.
    pub fn comments(&self, path: impl AsRef<Path>) -> Option<Comments> {
        self.lock().get(path.as_ref()).map(|s| s.comments.clone())
    }

    /// Current operation counters.
    pub fn metrics(&self) -> MemoryMetrics {
        MemoryMetrics {
            init_calls: self.counters.init_calls.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            seeks: self.counters.seeks.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, StoredStream>> {
        match self.streams.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl FormatBackend for MemoryBackend {
    fn init(&self) -> AudioStreamResult<()> {
        self.counters.init_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn open_read(&self, path: &Path) -> AudioStreamResult<Box<dyn FormatHandle>> {
        let stored = self
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AudioStreamError::open_failure(path, "no such stream"))?;
        if stored.signal.precision > 32 {
            return Err(AudioStreamError::UnsupportedType(format!(
                "stream declares {}-bit samples; canonical samples are 32-bit",
                stored.signal.precision
            )));
        }
        Ok(Box::new(MemoryHandle {
            mode: Mode::Read,
            stored,
            cursor: 0,
            path: path.to_path_buf(),
            streams: Arc::clone(&self.streams),
            counters: Arc::clone(&self.counters),
            persisted: false,
        }))
    }

    fn open_write(
        &self,
        path: &Path,
        signal: &SignalSpec,
        encoding: &EncodingSpec,
        filetype: Option<&str>,
        overwrite: &OverwritePolicy,
    ) -> AudioStreamResult<Box<dyn FormatHandle>> {
        if self.lock().contains_key(path) && !overwrite.permits(path) {
            return Err(AudioStreamError::open_failure(
                path,
                "file exists and overwriting was not permitted",
            ));
        }
        let filetype = filetype
            .map(str::to_string)
            .or_else(|| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "mem".to_string());
        let stored = StoredStream {
            signal: SignalSpec {
                length: None,
                ..signal.clone()
            },
            encoding: encoding.clone(),
            filetype,
            samples: Vec::new(),
            comments: Comments::new(),
        };
        Ok(Box::new(MemoryHandle {
            mode: Mode::Write,
            stored,
            cursor: 0,
            path: path.to_path_buf(),
            streams: Arc::clone(&self.streams),
            counters: Arc::clone(&self.counters),
            persisted: false,
        }))
    }

    fn format_names(&self) -> Vec<String> {
        vec!["mem".to_string(), "raw".to_string()]
    }
}

/// One open in-memory stream.
struct MemoryHandle {
    mode: Mode,
    stored: StoredStream,
    cursor: usize,
    path: PathBuf,
    streams: Arc<Mutex<HashMap<PathBuf, StoredStream>>>,
    counters: Arc<Counters>,
    persisted: bool,
}

impl MemoryHandle {
    fn persist(&mut self) {
        if self.persisted || self.mode != Mode::Write {
            return;
        }
        self.persisted = true;
        let mut stored = self.stored.clone();
        stored.signal.length = Some(stored.samples.len() as u64);
        let mut streams = match self.streams.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        streams.insert(self.path.clone(), stored);
    }
}

impl FormatHandle for MemoryHandle {
    fn signal(&self) -> &SignalSpec {
        &self.stored.signal
    }

    fn encoding(&self) -> &EncodingSpec {
        &self.stored.encoding
    }

    fn filetype(&self) -> &str {
        &self.stored.filetype
    }

    fn seekable(&self) -> bool {
        self.mode == Mode::Read
    }

    fn read(&mut self, buf: &mut [i32]) -> AudioStreamResult<usize> {
        if self.mode != Mode::Read {
            return Err(AudioStreamError::WrongMode { needed: Mode::Read });
        }
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        let remaining = self.stored.samples.len().saturating_sub(self.cursor);
        let n = remaining.min(buf.len());
        buf[..n].copy_from_slice(&self.stored.samples[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[i32]) -> AudioStreamResult<usize> {
        if self.mode != Mode::Write {
            return Err(AudioStreamError::WrongMode { needed: Mode::Write });
        }
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        self.stored.samples.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn seek(&mut self, sample_offset: u64) -> AudioStreamResult<()> {
        if !self.seekable() {
            return Err(AudioStreamError::seek_failure(
                sample_offset,
                "stream is not seekable",
            ));
        }
        self.counters.seeks.fetch_add(1, Ordering::Relaxed);
        let len = self.stored.samples.len() as u64;
        self.cursor = sample_offset.min(len) as usize;
        Ok(())
    }

    fn comments(&self) -> &Comments {
        &self.stored.comments
    }

    fn comments_mut(&mut self) -> &mut Comments {
        &mut self.stored.comments
    }

    fn close(&mut self) -> AudioStreamResult<()> {
        self.persist();
        Ok(())
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        // An abandoned write handle still lands its data.
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_serves_short_tail() {
        let backend = MemoryBackend::new();
        backend.insert("a.mem", 8000.0, 1, vec![1, 2, 3]);
        let mut handle = backend.open_read(Path::new("a.mem")).unwrap();
        let mut buf = [0i32; 8];
        assert_eq!(handle.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_open_read_missing_stream_fails() {
        let backend = MemoryBackend::new();
        let err = backend.open_read(Path::new("missing")).err().unwrap();
        assert!(matches!(err, AudioStreamError::OpenFailure { .. }));
    }

    #[test]
    fn test_open_read_rejects_unrepresentable_precision() {
        let backend = MemoryBackend::new();
        let signal = SignalSpec {
            rate: 8000.0,
            channels: 1,
            precision: 64,
            length: Some(1),
        };
        backend.insert_with("wide.mem", signal, EncodingSpec::default(), vec![0]);
        let err = backend.open_read(Path::new("wide.mem")).err().unwrap();
        assert!(matches!(err, AudioStreamError::UnsupportedType(_)));
    }

    #[test]
    fn test_seek_repositions_cursor() {
        let backend = MemoryBackend::new();
        backend.insert("b.mem", 8000.0, 1, vec![10, 20, 30, 40]);
        let mut handle = backend.open_read(Path::new("b.mem")).unwrap();
        handle.seek(2).unwrap();
        let mut buf = [0i32; 4];
        assert_eq!(handle.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[30, 40]);
        assert_eq!(backend.metrics().seeks, 1);
    }

    #[test]
    fn test_write_persists_on_close_with_length() {
        let backend = MemoryBackend::new();
        let signal = SignalSpec::new(8000.0, 2);
        let encoding = EncodingSpec::new(Encoding::Sign2);
        let mut handle = backend
            .open_write(
                Path::new("out.mem"),
                &signal,
                &encoding,
                None,
                &OverwritePolicy::Refuse,
            )
            .unwrap();
        handle.write(&[1, 2, 3, 4]).unwrap();
        handle.close().unwrap();
        drop(handle);
        assert_eq!(backend.samples("out.mem"), Some(vec![1, 2, 3, 4]));
        let reopened = backend.open_read(Path::new("out.mem")).unwrap();
        assert_eq!(reopened.signal().length, Some(4));
    }

    #[test]
    fn test_overwrite_policy_is_honored() {
        let backend = MemoryBackend::new();
        backend.insert("busy.mem", 8000.0, 1, vec![7]);
        let signal = SignalSpec::new(8000.0, 1);
        let encoding = EncodingSpec::default();
        let refused = backend.open_write(
            Path::new("busy.mem"),
            &signal,
            &encoding,
            None,
            &OverwritePolicy::Refuse,
        );
        assert!(matches!(refused, Err(AudioStreamError::OpenFailure { .. })));
        assert!(
            backend
                .open_write(
                    Path::new("busy.mem"),
                    &signal,
                    &encoding,
                    None,
                    &OverwritePolicy::Allow,
                )
                .is_ok()
        );
    }

    #[test]
    fn test_filetype_prefers_hint_then_extension() {
        let backend = MemoryBackend::new();
        let signal = SignalSpec::new(8000.0, 1);
        let encoding = EncodingSpec::default();
        let handle = backend
            .open_write(
                Path::new("song.wav"),
                &signal,
                &encoding,
                Some("flac"),
                &OverwritePolicy::Refuse,
            )
            .unwrap();
        assert_eq!(handle.filetype(), "flac");
        let handle = backend
            .open_write(
                Path::new("other.wav"),
                &signal,
                &encoding,
                None,
                &OverwritePolicy::Refuse,
            )
            .unwrap();
        assert_eq!(handle.filetype(), "wav");
    }
}
