//! Audio level estimation: one frame of signed samples in, one loudness out.

use crate::config::{
    ABSOLUTE_MAX_NOISE,
    FRAME_SIZE,
    LOUDNESS_DIVISOR,
};

/// One block of samples delivered by a completed microphone read.
pub type AudioFrame = [i16; FRAME_SIZE];

/// Normalised loudness in `0..=ABSOLUTE_MAX_NOISE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Loudness(u32);

impl Loudness {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(ABSOLUTE_MAX_NOISE);

    /// Build a loudness value, clamping anything above [`Loudness::MAX`].
    pub const fn new(value: u32) -> Self {
        if value > ABSOLUTE_MAX_NOISE {
            Self::MAX
        } else {
            Self(value)
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Normalise a raw magnitude sum into the gauge range.
pub const fn loudness_from_sum(sum: u64) -> Loudness {
    let scaled = sum / LOUDNESS_DIVISOR;
    if scaled > ABSOLUTE_MAX_NOISE as u64 {
        Loudness::MAX
    } else {
        Loudness(scaled as u32)
    }
}

/// Sum the absolute value of every sample and normalise the result.
///
/// The accumulator is 64-bit, so any frame length that fits in memory is safe
/// (`i16::MIN` contributes 32768).
pub fn estimate_loudness(frame: &[i16]) -> Loudness {
    let sum: u64 = frame.iter().map(|s| u64::from(s.unsigned_abs())).sum();
    loudness_from_sum(sum)
}
