//! Compile-time configuration.

use crate::offscreen::OffscreenBuffer;

/// Samples captured per asynchronous microphone read.
pub const FRAME_SIZE: usize = 1024;

/// Microphone sample rate (16 kHz).
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Summed sample magnitudes are divided by this to land in the gauge range.
pub const LOUDNESS_DIVISOR: u64 = 10;

/// Upper clamp for a normalised loudness value; the needle pins here.
pub const ABSOLUTE_MAX_NOISE: u32 = FIRST_BREAKPOINT + SECOND_SEGMENT_SPAN;

/// Loudness at which the needle curve changes slope.
pub const FIRST_BREAKPOINT: u32 = 15_000;

/// Width of the steeper second curve segment.
pub const SECOND_SEGMENT_SPAN: u32 = 7_500;

/// Anti-aliasing factor: the needle is sampled `AA_FACTOR²` times per pixel.
pub const AA_FACTOR: u8 = 4;

/// Main loop period: one touch scan and one gauge refresh per tick.
pub const SCAN_PERIOD_MS: u64 = 20;

/// Consecutive equal button samples required before a state change is accepted.
pub const DEBOUNCE_SCANS: u8 = 2;

/// Heap handed to `esp-alloc` at boot.
pub const HEAP_SIZE: usize = 128 * 1024;

/// Screen width of the badge LCD in landscape orientation.
pub const SCREEN_WIDTH: u32 = 320;

/// Screen height of the badge LCD in landscape orientation.
pub const SCREEN_HEIGHT: u32 = 170;

/// Free heap required before the gauge page may allocate its drawing resource:
/// two region-sized buffers plus slack for the allocator.
pub const RECOMMENDED_MEMORY: usize =
    2 * OffscreenBuffer::byte_size(crate::gauge::GaugeLayout::BADGE.size) + 4 * 1024;
