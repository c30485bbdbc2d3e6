//! Audio capture interface and the frame hand-off between the capture side
//! and the main loop.

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    signal::Signal,
};

use crate::level::AudioFrame;

/// An asynchronous frame source polled from the main loop.
pub trait AudioSource {
    /// Ask for the next frame. Returns immediately; completion is observed
    /// through [`try_take_frame`](AudioSource::try_take_frame).
    fn start_read(&mut self);

    /// The frame completed since the last call, if any.
    fn try_take_frame(&mut self) -> Option<AudioFrame>;
}

/// Single-producer, single-consumer link between a capture task (or
/// interrupt) and the main loop.
///
/// The consumer posts a read request; the producer waits for it, fills a
/// frame and publishes it with [`complete`](FrameLink::complete), which only
/// sets a signal and never touches the display or touch state.
pub struct FrameLink {
    request: Signal<CriticalSectionRawMutex, ()>,
    ready: Signal<CriticalSectionRawMutex, AudioFrame>,
}

impl FrameLink {
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
            ready: Signal::new(),
        }
    }

    /// Producer side: wait until the main loop asks for a frame.
    pub async fn wait_request(&self) {
        self.request.wait().await;
    }

    /// Producer side: publish a finished frame.
    pub fn complete(&self, frame: AudioFrame) {
        self.ready.signal(frame);
    }
}

impl Default for FrameLink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for &FrameLink {
    fn start_read(&mut self) {
        self.request.signal(());
    }

    fn try_take_frame(&mut self) -> Option<AudioFrame> {
        self.ready.try_take()
    }
}
