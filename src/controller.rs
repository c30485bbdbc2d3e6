//! Page/input state machine driving the sample → angle → redraw cycle.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};

use crate::{
    audio::AudioSource,
    gauge::{
        GaugeError,
        GaugePage,
    },
    level::{
        Loudness,
        estimate_loudness,
    },
    pages::{
        Page,
        draw_memory_error,
        draw_static_page,
    },
    touch::{
        EdgeDetector,
        Navigation,
        TouchSensor,
    },
};

/// Owns every piece of mutable application state: current page, button
/// history, last loudness and the gauge page with its drawing resource.
pub struct PageController<G> {
    page: Page,
    edges: EdgeDetector,
    gauge: G,
    gauge_live: bool,
    loudness: Loudness,
    read_in_flight: bool,
    /// The outstanding read was requested before the gauge was last hidden.
    stale_read: bool,
}

impl<G> PageController<G> {
    pub const fn new(gauge: G) -> Self {
        Self {
            page: Page::Logo,
            edges: EdgeDetector::new(),
            gauge,
            gauge_live: false,
            loudness: Loudness::ZERO,
            read_in_flight: false,
            stale_read: false,
        }
    }

    pub const fn page(&self) -> Page {
        self.page
    }

    /// Loudness of the most recent frame; held between frames.
    pub const fn loudness(&self) -> Loudness {
        self.loudness
    }

    pub const fn gauge(&self) -> &G {
        &self.gauge
    }

    /// Whether the gauge page is showing with its drawing resource allocated.
    pub const fn gauge_live(&self) -> bool {
        self.gauge_live
    }

    /// Show the splash page and kick off the first touch scan.
    pub fn start<D, T>(&mut self, display: &mut D, touch: &mut T) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        T: TouchSensor,
    {
        draw_static_page(display, self.page)?;
        touch.scan_all_widgets();
        info!("controller started on page {}", self.page.index());
        Ok(())
    }

    /// One main-loop iteration.
    ///
    /// Processes a finished touch scan (at most one page change), then, on
    /// the gauge page, folds in a completed audio frame if there is one and
    /// redraws the needle either way.
    pub fn run_cycle<D, T, A>(&mut self, display: &mut D, touch: &mut T, audio: &mut A) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        T: TouchSensor,
        A: AudioSource,
        G: GaugePage<D>,
    {
        if !touch.is_busy() {
            touch.process_all_widgets();
            let navigation = self.edges.poll(touch);
            touch.scan_all_widgets();

            if let Some(navigation) = navigation {
                self.navigate(display, audio, navigation)?;
            }
        }

        if self.page == Page::GAUGE && self.gauge_live {
            self.refresh_gauge(display, audio)?;
        }
        Ok(())
    }

    fn navigate<D, A>(&mut self, display: &mut D, audio: &mut A, navigation: Navigation) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        A: AudioSource,
        G: GaugePage<D>,
    {
        let from = self.page;
        let to = match navigation {
            Navigation::Previous => from.previous(),
            Navigation::Next => from.next(),
        };
        info!("page {} -> {}", from.index(), to.index());

        if from == Page::GAUGE && self.gauge_live {
            self.gauge.leave();
            self.gauge_live = false;
            self.drop_pending_frame(audio);
        }
        self.page = to;

        if to == Page::GAUGE {
            self.enter_gauge(display, audio)
        } else {
            draw_static_page(display, to)
        }
    }

    fn enter_gauge<D, A>(&mut self, display: &mut D, audio: &mut A) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        A: AudioSource,
        G: GaugePage<D>,
    {
        match self.gauge.enter(display) {
            Ok(()) => {
                self.gauge_live = true;
                self.loudness = Loudness::ZERO;
                self.ensure_read(audio);
                Ok(())
            }
            Err(GaugeError::OutOfMemory { free, required }) => {
                warn!(
                    "gauge page unavailable: {=usize} of {=usize} bytes free",
                    free,
                    required
                );
                draw_memory_error(display)
            }
            Err(GaugeError::Display(e)) => Err(e),
        }
    }

    fn ensure_read<A: AudioSource>(&mut self, audio: &mut A) {
        if !self.read_in_flight {
            audio.start_read();
            self.read_in_flight = true;
        }
    }

    /// Samples captured while the gauge was hidden never reach the needle.
    fn drop_pending_frame<A: AudioSource>(&mut self, audio: &mut A) {
        if !self.read_in_flight {
            return;
        }
        if audio.try_take_frame().is_some() {
            self.read_in_flight = false;
        } else {
            self.stale_read = true;
        }
    }

    fn refresh_gauge<D, A>(&mut self, display: &mut D, audio: &mut A) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
        A: AudioSource,
        G: GaugePage<D>,
    {
        self.ensure_read(audio);
        if let Some(frame) = audio.try_take_frame() {
            self.read_in_flight = false;
            if self.stale_read {
                self.stale_read = false;
            } else {
                self.loudness = estimate_loudness(&frame);
                trace!("loudness {}", self.loudness.get());
            }
            // Capture the next frame while this one is drawn.
            self.ensure_read(audio);
        }

        match self.gauge.render(display, self.loudness) {
            Ok(()) => Ok(()),
            Err(GaugeError::Display(e)) => Err(e),
            Err(GaugeError::OutOfMemory { .. }) => {
                self.gauge_live = false;
                draw_memory_error(display)
            }
        }
    }
}
