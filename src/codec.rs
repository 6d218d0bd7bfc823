//! # Canonical Sample Codec
//!
//! Pure, stateless conversion from native numeric sample blocks into the
//! canonical fixed-point representation used throughout the streaming core:
//! signed 32-bit integers spanning [`SAMPLE_MIN`, `SAMPLE_MAX`].
//!
//! The codec is the only place in the crate that knows how native formats
//! map onto canonical samples. Reads never need the reverse direction —
//! canonical values are handed back to callers unconverted.
//!
//! ## Conversion rules
//!
//! - **Unsigned 8-bit / 16-bit integers**: the sign bit is flipped and the
//!   value widened into the top bits of the canonical sample. Exact and
//!   lossless; magnitude ordering is preserved and nothing ever clips.
//! - **64-bit integers**: the high 32 bits are kept (arithmetic shift).
//!   Lossy by design — truncation, not rounding — to stay bit-for-bit
//!   compatible with existing output.
//! - **Floats**: the nominal range `[-1, 1)` maps to the full canonical
//!   range via `floor(MULT * value + 0.5)` with `MULT = 1 + SAMPLE_MAX`
//!   (round to nearest, ties toward +∞). Out-of-range values clamp to the
//!   nearest bound and each clamped element counts one clip.
//! - **32-bit integers** are already canonical: the block moves through
//!   untouched, with no conversion pass and no allocation.
//!
//! ## Example
//!
//! ```rust
//! use audio_stream::codec::{self, NativeSamples, SAMPLE_MAX};
//! use ndarray::array;
//!
//! let native = NativeSamples::from(array![0.0f32, 1.0]);
//! let (canonical, clips) = codec::encode(native);
//! assert_eq!(canonical[[0, 0]], 0);
//! assert_eq!(canonical[[1, 0]], SAMPLE_MAX); // 1.0 is out of [-1, 1)
//! assert_eq!(clips, 1);
//! ```

use ndarray::{Array1, Array2, Axis};
use num_traits::AsPrimitive;

/// Bit width of the canonical sample representation.
pub const SAMPLE_PRECISION: u32 = 32;

/// Smallest representable canonical sample.
pub const SAMPLE_MIN: i32 = i32::MIN;

/// Largest representable canonical sample.
pub const SAMPLE_MAX: i32 = i32::MAX;

/// Scale applied to floats in `[-1, 1)`. Note `SAMPLE_MIN == -MULT`.
const MULT: f64 = 1.0 + SAMPLE_MAX as f64;

/// Rounding bias; `floor(x + 0.5)` rounds to nearest with ties toward +∞.
const BIAS: f64 = 0.5;

/// Floats below this clip to [`SAMPLE_MIN`]:
/// `floor(MULT * v + BIAS) < SAMPLE_MIN  ⇔  v < (SAMPLE_MIN - BIAS) / MULT`.
const CLIP_MIN: f64 = -1.0 - BIAS / MULT;

/// Floats at or above this clip to [`SAMPLE_MAX`]:
/// `floor(MULT * v + BIAS) > SAMPLE_MAX  ⇔  v >= (SAMPLE_MAX + 1 - BIAS) / MULT`.
const CLIP_MAX: f64 = 1.0 - BIAS / MULT;

/// Scalar conversion into the canonical representation.
///
/// Returns the canonical sample and whether the value had to be clamped to
/// a representable bound. Integer conversions never clip.
pub trait ToCanonical: Copy {
    /// Convert one native value to a canonical sample.
    fn to_canonical(self) -> (i32, bool);
}

impl ToCanonical for u8 {
    #[inline(always)]
    fn to_canonical(self) -> (i32, bool) {
        (((self ^ 0x80) as i8 as i32) << 24, false)
    }
}

impl ToCanonical for i16 {
    #[inline(always)]
    fn to_canonical(self) -> (i32, bool) {
        // The bits are treated as unsigned: flip the sign bit, then widen.
        ((((self as u16) ^ 0x8000) as i16 as i32) << 16, false)
    }
}

impl ToCanonical for i32 {
    #[inline(always)]
    fn to_canonical(self) -> (i32, bool) {
        (self, false)
    }
}

impl ToCanonical for i64 {
    #[inline(always)]
    fn to_canonical(self) -> (i32, bool) {
        // High-word truncation; the low 32 bits are discarded, not rounded.
        ((self >> 32) as i32, false)
    }
}

/// Generates float conversions through the common `f64` path.
macro_rules! impl_float_to_canonical {
    ($($t:ty),*) => {$(
        impl ToCanonical for $t {
            #[inline(always)]
            fn to_canonical(self) -> (i32, bool) {
                float_to_canonical(self)
            }
        }
    )*};
}

impl_float_to_canonical!(f32, f64);

#[inline(always)]
fn float_to_canonical<T: AsPrimitive<f64>>(value: T) -> (i32, bool) {
    let value: f64 = value.as_();
    if value < CLIP_MIN {
        (SAMPLE_MIN, true)
    } else if value >= CLIP_MAX {
        (SAMPLE_MAX, true)
    } else {
        ((MULT * value + BIAS).floor() as i32, false)
    }
}

/// A block of native-typed samples awaiting conversion.
///
/// The closed set of native representations the codec accepts. Blocks are
/// shaped `(frames, channels)` in standard layout, so the underlying memory
/// is exactly the interleaved per-frame order the backend expects. Mono
/// data may also be supplied as a flat [`Array1`], which lands as a single
/// column.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeSamples {
    /// Unsigned 8-bit samples.
    Uint8(Array2<u8>),
    /// 16-bit samples whose bit pattern is treated as unsigned.
    Int16(Array2<i16>),
    /// Already-canonical 32-bit samples.
    Int32(Array2<i32>),
    /// 64-bit samples; only the high word survives conversion.
    Int64(Array2<i64>),
    /// 32-bit floats in the nominal range `[-1, 1)`.
    Float32(Array2<f32>),
    /// 64-bit floats in the nominal range `[-1, 1)`.
    Float64(Array2<f64>),
}

impl NativeSamples {
    /// Number of frames in the block.
    pub fn frames(&self) -> usize {
        self.dim().0
    }

    /// Number of interleaved channels per frame.
    pub fn channels(&self) -> usize {
        self.dim().1
    }

    /// Total sample count across all channels.
    pub fn total_samples(&self) -> usize {
        let (frames, channels) = self.dim();
        frames * channels
    }

    /// Whether the block is already in the canonical representation.
    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Int32(_))
    }

    /// Short name of the native kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Uint8(_) => "u8",
            Self::Int16(_) => "i16",
            Self::Int32(_) => "i32",
            Self::Int64(_) => "i64",
            Self::Float32(_) => "f32",
            Self::Float64(_) => "f64",
        }
    }

    fn dim(&self) -> (usize, usize) {
        match self {
            Self::Uint8(a) => a.dim(),
            Self::Int16(a) => a.dim(),
            Self::Int32(a) => a.dim(),
            Self::Int64(a) => a.dim(),
            Self::Float32(a) => a.dim(),
            Self::Float64(a) => a.dim(),
        }
    }
}

/// Generates the `From` impls wrapping native arrays into [`NativeSamples`].
macro_rules! impl_native_from {
    ($($t:ty => $variant:ident),*) => {$(
        impl From<Array2<$t>> for NativeSamples {
            fn from(block: Array2<$t>) -> Self {
                Self::$variant(block)
            }
        }

        impl From<Array1<$t>> for NativeSamples {
            fn from(mono: Array1<$t>) -> Self {
                Self::$variant(mono.insert_axis(Axis(1)))
            }
        }
    )*};
}

impl_native_from!(
    u8 => Uint8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64
);

/// Convert a native block into canonical samples.
///
/// Returns the canonical block (same shape as the input) and the number of
/// elements that were clamped to a representable bound. Deterministic and
/// allocation-free for already-canonical input, which moves through as the
/// identity.
pub fn encode(native: NativeSamples) -> (Array2<i32>, u64) {
    match native {
        NativeSamples::Int32(block) => (block, 0),
        NativeSamples::Uint8(block) => convert_block(&block),
        NativeSamples::Int16(block) => convert_block(&block),
        NativeSamples::Int64(block) => convert_block(&block),
        NativeSamples::Float32(block) => convert_block(&block),
        NativeSamples::Float64(block) => convert_block(&block),
    }
}

fn convert_block<T: ToCanonical>(block: &Array2<T>) -> (Array2<i32>, u64) {
    let mut clips = 0u64;
    let canonical = block.map(|&value| {
        let (sample, clipped) = value.to_canonical();
        clips += u64::from(clipped);
        sample
    });
    (canonical, clips)
}
