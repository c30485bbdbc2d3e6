//! Host-side stand-ins for the badge peripherals.

extern crate alloc;

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

use crate::{
    audio::AudioSource,
    config::{
        FRAME_SIZE,
        SCREEN_HEIGHT,
        SCREEN_WIDTH,
    },
    level::AudioFrame,
    touch::{
        TouchButton,
        TouchSensor,
    },
};

/// 320×170 LCD that records every blit.
pub struct TestLcd {
    pixels: Vec<Rgb565>,
    pub blits: Vec<Rectangle>,
    pub clears: usize,
    pub pixel_writes: usize,
}

impl TestLcd {
    pub fn new() -> Self {
        Self {
            pixels: alloc::vec![Rgb565::BLACK; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
            blits: Vec::new(),
            clears: 0,
            pixel_writes: 0,
        }
    }

    pub fn operations(&self) -> usize {
        self.blits.len() + self.clears + self.pixel_writes
    }

    pub fn pixel(&self, p: Point) -> Rgb565 {
        self.pixels[p.y as usize * SCREEN_WIDTH as usize + p.x as usize]
    }

    pub fn any_lit(&self, area: &Rectangle) -> bool {
        area.points().any(|p| self.pixel(p) != Rgb565::BLACK)
    }

    fn set(&mut self, p: Point, color: Rgb565) {
        if self.bounding_box().contains(p) {
            self.pixels[p.y as usize * SCREEN_WIDTH as usize + p.x as usize] = color;
        }
    }
}

impl OriginDimensions for TestLcd {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for TestLcd {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            self.pixel_writes += 1;
            self.set(p, color);
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.blits.push(*area);
        for (p, color) in area.points().zip(colors) {
            self.set(p, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clears += 1;
        self.pixels.fill(color);
        Ok(())
    }
}

/// Two-button touch panel driven from the test.
#[derive(Default)]
pub struct MockTouch {
    pub busy: bool,
    pub pressed: [bool; 2],
    pub scans: usize,
    pub processed: usize,
}

impl MockTouch {
    pub fn press(&mut self, button: TouchButton) {
        self.pressed[button as usize] = true;
    }

    pub fn release_all(&mut self) {
        self.pressed = [false; 2];
    }
}

impl TouchSensor for MockTouch {
    fn scan_all_widgets(&mut self) {
        self.scans += 1;
    }

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn process_all_widgets(&mut self) {
        self.processed += 1;
    }

    fn is_sensor_active(&self, button: TouchButton) -> bool {
        self.pressed[button as usize]
    }
}

/// Microphone that completes a read only when the test says so.
#[derive(Default)]
pub struct MockAudio {
    pub in_flight: bool,
    pub ready: Option<AudioFrame>,
    pub reads_started: usize,
    pub polled_idle: usize,
}

impl MockAudio {
    /// Complete the outstanding read with every sample set to `value`.
    pub fn complete(&mut self, value: i16) {
        assert!(self.in_flight, "no read in flight");
        self.in_flight = false;
        self.ready = Some([value; FRAME_SIZE]);
    }
}

impl AudioSource for MockAudio {
    fn start_read(&mut self) {
        self.in_flight = true;
        self.reads_started += 1;
    }

    fn try_take_frame(&mut self) -> Option<AudioFrame> {
        if self.ready.is_none() && !self.in_flight {
            self.polled_idle += 1;
        }
        self.ready.take()
    }
}
