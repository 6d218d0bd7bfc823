//! Encoding identifiers reported by format backends.
//!
//! A backend describes how samples are stored on disk with one of these
//! identifiers. The core only carries the identifier around for reporting
//! and for write-open requests; it never performs any of the encodings
//! itself.

use serde::{Deserialize, Serialize};

/// How lossy an encoding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossClass {
    /// Decodes back to the exact samples that were written.
    Lossless,
    /// Loses information once, at encode time.
    Lossy,
    /// Loses information again on every transcode.
    DoublyLossy,
}

/// Generates the [`Encoding`] enum with its metadata table.
macro_rules! encodings {
    ($($variant:ident = $id:literal, $loss:ident, $name:expr, $desc:expr;)*) => {
        /// Sample encoding identifiers understood by format backends.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum Encoding {
            $(
                #[doc = $desc]
                $variant = $id,
            )*
        }

        impl Encoding {
            /// Every known encoding, in identifier order.
            pub const ALL: &'static [Encoding] = &[$(Encoding::$variant),*];

            /// Numeric identifier, stable across releases.
            pub fn id(self) -> u32 {
                self as u32
            }

            /// Look up an encoding by its numeric identifier.
            pub fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Short display name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// One-line description.
            pub fn description(self) -> &'static str {
                match self {
                    $(Self::$variant => $desc,)*
                }
            }

            /// Loss class of the encoding.
            pub fn loss(self) -> LossClass {
                match self {
                    $(Self::$variant => LossClass::$loss,)*
                }
            }

            /// Look up an encoding by display name, case-insensitively.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|e| e.name().eq_ignore_ascii_case(name))
            }
        }
    };
}

encodings! {
    Unknown = 0, Lossless, "n/a", "Unknown or not applicable";
    Sign2 = 1, Lossless, "Signed PCM", "Signed integer PCM";
    Unsigned = 2, Lossless, "Unsigned PCM", "Unsigned integer PCM";
    Float = 3, Lossless, "F.P. PCM", "Floating-point PCM";
    FloatText = 4, Lossless, "F.P. PCM (text)", "Floating-point PCM stored as text";
    Flac = 5, Lossless, "FLAC", "Free Lossless Audio Codec";
    Hcom = 6, Lossy, "HCOM", "HCOM Huffman compression";
    Wavpack = 7, Lossless, "WavPack", "WavPack lossless compression";
    Wavpackf = 8, Lossy, "WavPack f.p.", "WavPack lossy floating-point mode";
    Ulaw = 9, Lossy, "u-law", "ITU-T G.711 mu-law companding";
    Alaw = 10, Lossy, "A-law", "ITU-T G.711 A-law companding";
    G721 = 11, Lossy, "G.721 ADPCM", "ITU-T G.721 4-bit ADPCM";
    G723 = 12, Lossy, "G.723 ADPCM", "ITU-T G.723 3- or 5-bit ADPCM";
    ClAdpcm = 13, Lossy, "CL ADPCM (8)", "Creative Labs 8-bit ADPCM";
    ClAdpcm16 = 14, Lossy, "CL ADPCM (16)", "Creative Labs 16-bit ADPCM";
    MsAdpcm = 15, Lossy, "MS ADPCM", "Microsoft ADPCM";
    ImaAdpcm = 16, Lossy, "IMA ADPCM", "IMA/DVI ADPCM";
    OkiAdpcm = 17, Lossy, "OKI ADPCM", "OKI/Dialogic ADPCM";
    Dpcm = 18, Lossy, "DPCM", "Differential PCM";
    Dwvw = 19, Lossy, "DWVW", "Delta width variable word";
    Dwvwn = 20, Lossy, "DWVW (n-bit)", "Delta width variable word, n-bit";
    Gsm = 21, Lossy, "GSM", "GSM 06.10 full-rate speech";
    Mp3 = 22, DoublyLossy, "MP3", "MPEG layer 3 compression";
    Vorbis = 23, DoublyLossy, "Vorbis", "Xiph.org Vorbis compression";
    AmrWb = 24, DoublyLossy, "AMR-WB", "Adaptive multi-rate wideband speech";
    AmrNb = 25, DoublyLossy, "AMR-NB", "Adaptive multi-rate narrowband speech";
    Cvsd = 26, Lossy, "CVSD", "Continuously variable slope delta modulation";
    Lpc10 = 27, Lossy, "LPC-10", "Linear predictive coding, 2.4 kbit/s";
    Opus = 28, DoublyLossy, "Opus", "Xiph.org Opus compression";
}

impl Default for Encoding {
    fn default() -> Self {
        Self::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for encoding in Encoding::ALL {
            assert_eq!(Encoding::from_id(encoding.id()), Some(*encoding));
        }
        assert_eq!(Encoding::from_id(999), None);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Encoding::from_name("flac"), Some(Encoding::Flac));
        assert_eq!(Encoding::from_name("Signed PCM"), Some(Encoding::Sign2));
        assert_eq!(Encoding::from_name("nope"), None);
    }

    #[test]
    fn test_loss_classes() {
        assert_eq!(Encoding::Sign2.loss(), LossClass::Lossless);
        assert_eq!(Encoding::Gsm.loss(), LossClass::Lossy);
        assert_eq!(Encoding::Opus.loss(), LossClass::DoublyLossy);
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Encoding::default(), Encoding::Unknown);
    }
}
