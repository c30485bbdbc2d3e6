//! Heap-backed off-screen pixel buffer.
//!
//! Drawing happens here in screen coordinates; [`OffscreenBuffer::present`]
//! then pushes a finished rectangle to the LCD with a single blit so the
//! panel never shows a half-drawn frame.

extern crate alloc;

use alloc::{
    collections::TryReserveError,
    vec::Vec,
};
use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

/// RGB565 pixels covering one screen rectangle.
pub struct OffscreenBuffer {
    area: Rectangle,
    pixels: Vec<Rgb565>,
}

impl OffscreenBuffer {
    /// Heap bytes needed for a buffer of `size`.
    pub const fn byte_size(size: Size) -> usize {
        size.width as usize * size.height as usize * core::mem::size_of::<Rgb565>()
    }

    /// Allocate a buffer for `area` filled with `fill`.
    ///
    /// Allocation failure is reported instead of aborting.
    pub fn try_new(area: Rectangle, fill: Rgb565) -> Result<Self, TryReserveError> {
        let len = area.size.width as usize * area.size.height as usize;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, fill);
        Ok(Self { area, pixels })
    }

    fn index(&self, p: Point) -> Option<usize> {
        if !self.area.contains(p) {
            return None;
        }
        let local = p - self.area.top_left;
        Some(local.y as usize * self.area.size.width as usize + local.x as usize)
    }

    pub fn pixel(&self, p: Point) -> Option<Rgb565> {
        self.index(p).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, p: Point, color: Rgb565) {
        if let Some(i) = self.index(p) {
            self.pixels[i] = color;
        }
    }

    /// Mix `color` over the current pixel with weight `coverage / total`.
    pub fn blend(&mut self, p: Point, color: Rgb565, coverage: u32, total: u32) {
        let Some(i) = self.index(p) else {
            return;
        };
        if coverage >= total {
            self.pixels[i] = color;
            return;
        }
        let bg = self.pixels[i];
        let mix = |b: u8, f: u8| -> u8 {
            let (b, f) = (i32::from(b), i32::from(f));
            (b + (f - b) * coverage as i32 / total as i32) as u8
        };
        self.pixels[i] = Rgb565::new(
            mix(bg.r(), color.r()),
            mix(bg.g(), color.g()),
            mix(bg.b(), color.b()),
        );
    }

    /// Copy `area` (clipped to both buffers) from `source`.
    pub fn copy_area_from(&mut self, source: &Self, area: &Rectangle) {
        let area = area.intersection(&self.area).intersection(&source.area);
        for p in area.points() {
            if let (Some(dst), Some(src)) = (self.index(p), source.index(p)) {
                self.pixels[dst] = source.pixels[src];
            }
        }
    }

    /// Blit `area` (clipped to the buffer) to `target` in one transfer.
    pub fn present<D>(&self, target: &mut D, area: &Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = area.intersection(&self.area);
        if area.is_zero_sized() {
            return Ok(());
        }
        let pixels = area
            .points()
            .filter_map(|p| self.index(p).map(|i| self.pixels[i]));
        target.fill_contiguous(&area, pixels)
    }
}

impl Dimensions for OffscreenBuffer {
    fn bounding_box(&self) -> Rectangle {
        self.area
    }
}

impl DrawTarget for OffscreenBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            self.set_pixel(p, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}
