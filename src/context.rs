//! Engine context: explicit, once-only backend initialization.
//!
//! Codec engines usually carry process-wide state (format handler
//! registries, effect tables) that must be initialized before any stream
//! is opened. Instead of a module-level flag, that requirement is an
//! [`EngineContext`] value: constructing one runs the backend's
//! initialization exactly once, and every session open goes through the
//! context, so "initialized before use" holds by construction. Cloning a
//! context shares the already-initialized backend; no global mutable
//! state is involved.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{FormatBackend, Mode};
use crate::error::AudioStreamResult;
use crate::session::{AudioStream, WriteOptions};

/// Shared handle to an initialized codec/format engine.
#[derive(Clone)]
pub struct EngineContext {
    backend: Arc<dyn FormatBackend>,
}

impl EngineContext {
    /// Initialize the backend and wrap it in a context.
    ///
    /// The backend's [`init`](FormatBackend::init) runs here and nowhere
    /// else; a failure surfaces as
    /// [`Init`](crate::AudioStreamError::Init)-class error and no context
    /// is produced.
    pub fn initialize(backend: Arc<dyn FormatBackend>) -> AudioStreamResult<Self> {
        backend.init()?;
        Ok(Self { backend })
    }

    /// Open `path` for reading.
    pub fn open_read(&self, path: impl AsRef<Path>) -> AudioStreamResult<AudioStream> {
        let path = path.as_ref();
        let handle = self.backend.open_read(path)?;
        Ok(AudioStream::new(handle, Mode::Read, path.to_path_buf()))
    }

    /// Open `path` for writing with the given options.
    ///
    /// Descriptors are validated before the backend sees the request.
    pub fn open_write(
        &self,
        path: impl AsRef<Path>,
        options: WriteOptions,
    ) -> AudioStreamResult<AudioStream> {
        options.validate()?;
        let path = path.as_ref();
        let (signal, encoding, filetype, overwrite) = options.into_parts();
        let handle =
            self.backend
                .open_write(path, &signal, &encoding, filetype.as_deref(), &overwrite)?;
        Ok(AudioStream::new(handle, Mode::Write, path.to_path_buf()))
    }

    /// Names of the container formats the backend can handle.
    pub fn format_names(&self) -> Vec<String> {
        self.backend.format_names()
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[test]
    fn test_initialize_runs_backend_init_once() {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = EngineContext::initialize(Arc::clone(&backend) as Arc<dyn FormatBackend>)
            .expect("memory backend init cannot fail");
        assert_eq!(backend.metrics().init_calls, 1);

        // Clones share the initialized backend without re-running init.
        let _clone = ctx.clone();
        assert_eq!(backend.metrics().init_calls, 1);
    }

    #[test]
    fn test_open_read_missing_path_surfaces_backend_diagnostic() {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = EngineContext::initialize(backend).unwrap();
        let err = ctx.open_read("nowhere.mem").unwrap_err();
        assert!(err.to_string().contains("no such stream"));
    }
}
