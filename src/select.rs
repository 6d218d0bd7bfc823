//! Frame addressing for range-addressed reads.
//!
//! A [`FrameSelection`] names which frames a read should return, either
//! relative to the current position or absolutely. Bounds are one-based and
//! inclusive, and a bound of zero or below counts back from the end of the
//! stream, so `Index(0)` is the last frame and `Index(-1)` the one before
//! it. Strides other than one are not expressible.
//!
//! Resolution happens against the stream's current offset and total
//! length. Every selection needs the length, so streams whose backend
//! cannot report one only support count-based reads.

use crate::error::{AudioStreamError, AudioStreamResult};

/// Which frames of a stream to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSelection {
    /// Everything from the current offset to the end of the stream.
    Rest,
    /// The whole stream, from the first frame.
    All,
    /// A single frame, one-based; zero and negative values count from the
    /// end.
    Index(i64),
    /// An inclusive one-based span. `None` bounds default to the current
    /// offset (start) and the last frame (end); non-positive bounds count
    /// from the end.
    Span {
        /// Lower bound, defaulting to the frame after the current offset.
        start: Option<i64>,
        /// Upper bound, defaulting to the last frame.
        end: Option<i64>,
    },
}

/// A selection resolved to an absolute start frame and a frame count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFrames {
    /// Absolute frame index the read starts at.
    pub start: u64,
    /// Number of frames to read.
    pub frames: u64,
}

impl FrameSelection {
    /// Select an inclusive span with optional bounds.
    pub fn span(start: impl Into<Option<i64>>, end: impl Into<Option<i64>>) -> Self {
        Self::Span {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Resolve against the stream's current offset and total frame count.
    pub fn resolve(
        self,
        current_offset: u64,
        total_frames: Option<u64>,
    ) -> AudioStreamResult<ResolvedFrames> {
        let total = total_frames.ok_or_else(|| {
            AudioStreamError::invalid_argument(
                "stream length is unknown; only count-based reads are possible",
            )
        })?;
        let total = i64::try_from(total)
            .map_err(|_| AudioStreamError::invalid_argument("stream length out of range"))?;
        let offset = i64::try_from(current_offset)
            .map_err(|_| AudioStreamError::invalid_argument("stream offset out of range"))?;

        match self {
            Self::Rest => Ok(ResolvedFrames {
                start: current_offset,
                frames: total.saturating_sub(offset).max(0) as u64,
            }),
            Self::All => Ok(ResolvedFrames {
                start: 0,
                frames: total as u64,
            }),
            Self::Index(index) => {
                let index = from_end(index, total);
                if index < 1 || index > total {
                    return Err(AudioStreamError::invalid_argument(format!(
                        "frame index {index} outside 1..={total}"
                    )));
                }
                Ok(ResolvedFrames {
                    start: (index - 1) as u64,
                    frames: 1,
                })
            }
            Self::Span { start, end } => {
                let lo = match start {
                    Some(bound) => from_end(bound, total),
                    None => offset + 1,
                };
                let hi = match end {
                    Some(bound) => from_end(bound, total),
                    None => total,
                };
                if lo > hi || lo < 1 || hi > total {
                    return Err(AudioStreamError::invalid_argument(format!(
                        "invalid frame range {lo}..={hi} for a {total}-frame stream"
                    )));
                }
                Ok(ResolvedFrames {
                    start: (lo - 1) as u64,
                    frames: (hi - lo + 1) as u64,
                })
            }
        }
    }
}

impl From<i64> for FrameSelection {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<std::ops::RangeFull> for FrameSelection {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::All
    }
}

/// One-based bound with zero and negatives counting back from the end.
fn from_end(bound: i64, total: i64) -> i64 {
    if bound <= 0 { bound + total } else { bound }
}
