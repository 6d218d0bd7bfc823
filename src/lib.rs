// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![deny(missing_docs)] // Documentation is a must for release

//! # AudioStream
//!
//! A sample-accurate audio streaming core: it moves blocks of audio between
//! an opaque codec/format backend and your code, tracks a monotonically
//! advancing frame offset, supports random-access seeking, and performs
//! bit-exact conversion from native numeric formats into a canonical
//! 32-bit signed fixed-point sample representation.
//!
//! The crate deliberately contains no codecs. File decoding and encoding
//! live behind the [`FormatBackend`]/[`FormatHandle`] traits; this core
//! owns only the in-memory canonical format (interleaved frames of `i32`
//! samples) and the state machine around reading, seeking, and writing it.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use audio_stream::{EngineContext, MemoryBackend, WriteOptions};
//! use ndarray::array;
//!
//! # fn main() -> audio_stream::AudioStreamResult<()> {
//! let backend = Arc::new(MemoryBackend::new());
//! let ctx = EngineContext::initialize(backend)?;
//!
//! // Write a short mono clip from float samples.
//! let mut writer = ctx.open_write(
//!     "clip.mem",
//!     WriteOptions::new().channels(1).rate(8000.0),
//! )?;
//! writer.write(array![0.0f32, 0.25, -0.25])?;
//! writer.close()?;
//!
//! // Read it back as canonical samples.
//! let mut reader = ctx.open_read("clip.mem")?;
//! let block = reader.read(3)?.unwrap();
//! assert_eq!(block.dim(), (3, 1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`AudioStreamResult`]. Caller mistakes
//! (`InvalidArgument`, `Closed`, `WrongMode`) are detected before any
//! backend call; backend failures carry the backend's own diagnostic text
//! and are never retried:
//!
//! ```rust
//! use audio_stream::AudioStreamError;
//!
//! fn report(err: AudioStreamError) {
//!     match err {
//!         AudioStreamError::OpenFailure { path, reason } => {
//!             eprintln!("cannot open {}: {reason}", path.display());
//!         }
//!         other if other.is_caller_error() => eprintln!("bad call: {other}"),
//!         other => eprintln!("stream failed: {other}"),
//!     }
//! }
//! ```
//!
//! ## Concurrency
//!
//! Sessions are synchronous and blocking, and a single [`AudioStream`] is
//! not meant for concurrent use — it owns one backend handle and mutates
//! its offset in place. Independent sessions over distinct handles are
//! fully independent.

pub mod backend;
pub mod codec;
mod context;
pub mod encoding;
mod error;
pub mod metadata;
mod select;
mod session;

pub use crate::backend::memory::MemoryBackend;
pub use crate::backend::{
    EncodingSpec, FormatBackend, FormatHandle, Mode, OverwritePolicy, SignalSpec,
};
pub use crate::codec::{NativeSamples, SAMPLE_MAX, SAMPLE_MIN, SAMPLE_PRECISION};
pub use crate::context::EngineContext;
pub use crate::encoding::{Encoding, LossClass};
pub use crate::error::{AudioStreamError, AudioStreamResult};
pub use crate::metadata::Comments;
pub use crate::select::{FrameSelection, ResolvedFrames};
pub use crate::session::{AudioStream, WriteOptions};
