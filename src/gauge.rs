//! Analog noise gauge: static scale plus a rotating anti-aliased needle.
//!
//! The gauge owns an [`AutoDevice`] while its page is visible. The device
//! keeps the scale in one off-screen buffer and composes frames in a second
//! one; each refresh restores only the old needle footprint, paints the new
//! needle and blits the dirty rectangle in a single transfer.

extern crate alloc;

use alloc::collections::TryReserveError;
use core::fmt;

use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{
            FONT_6X10,
            FONT_10X20,
        },
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{
        Circle,
        Line,
        Polyline,
        PrimitiveStyle,
        Rectangle,
    },
    text::{
        Alignment,
        Baseline,
        Text,
        TextStyleBuilder,
    },
};

use crate::{
    config::{
        AA_FACTOR,
        RECOMMENDED_MEMORY,
        SCREEN_WIDTH,
    },
    level::Loudness,
    needle::{
        BREAKPOINT_DEGREES,
        DEG_TO_RAD,
        FULL_SCALE_DEGREES,
        NEEDLE_TEMPLATE,
        NeedleCurve,
        REST_DEGREES,
        Vertex,
        fill_polygon_aa,
        loudness_to_angle,
        rotate_polygon,
    },
    offscreen::OffscreenBuffer,
};

const ARC_STEPS: usize = 36;
const MAJOR_TICKS: usize = 11;
const RED_ZONE_DEGREES: f32 = 30.0;
const LABEL_OFFSET: f32 = 12.0;

/// Failure modes of the gauge page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GaugeError<E> {
    /// The draw target rejected an operation.
    Display(E),
    /// Not enough heap for the drawing resource; the page must not be shown.
    OutOfMemory { free: usize, required: usize },
}

impl<E: fmt::Debug> fmt::Display for GaugeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(e) => write!(f, "display error: {e:?}"),
            Self::OutOfMemory { free, required } => {
                write!(f, "not enough memory: {free} bytes free, {required} required")
            }
        }
    }
}

/// Where the gauge sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeLayout {
    pub origin: Point,
    pub size: Size,
    pub pivot: Point,
    pub radius: u32,
}

impl GaugeLayout {
    /// Centred below the page title on the 320×170 badge LCD.
    pub const BADGE: Self = Self {
        origin: Point::new(95, 38),
        size: Size::new(130, 130),
        pivot: Point::new(160, 103),
        radius: 58,
    };

    pub const fn area(&self) -> Rectangle {
        Rectangle::new(self.origin, self.size)
    }
}

/// Double-buffered drawing resource, live only while the gauge page is shown.
pub struct AutoDevice {
    background: OffscreenBuffer,
    frame: OffscreenBuffer,
    draw_fixed: bool,
    needle_bounds: Option<Rectangle>,
}

impl AutoDevice {
    fn allocate(area: Rectangle) -> Result<Self, TryReserveError> {
        Ok(Self {
            background: OffscreenBuffer::try_new(area, Rgb565::BLACK)?,
            frame: OffscreenBuffer::try_new(area, Rgb565::BLACK)?,
            draw_fixed: true,
            needle_bounds: None,
        })
    }
}

/// Smallest rectangle covering both inputs; zero-sized inputs are ignored.
fn union(a: &Rectangle, b: &Rectangle) -> Rectangle {
    match (a.bottom_right(), b.bottom_right()) {
        (None, _) => *b,
        (_, None) => *a,
        (Some(a_br), Some(b_br)) => Rectangle::with_corners(
            a.top_left.component_min(b.top_left),
            a_br.component_max(b_br),
        ),
    }
}

fn polar(pivot: Point, radius: f32, degrees: f32) -> Point {
    let rad = degrees * DEG_TO_RAD;
    Point::new(
        pivot.x + libm::roundf(radius * libm::cosf(rad)) as i32,
        pivot.y - libm::roundf(radius * libm::sinf(rad)) as i32,
    )
}

/// Paint the dial: arc, red zone, major ticks, end labels and the hub.
fn draw_scale<D>(target: &mut D, layout: &GaugeLayout) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::BLACK)?;

    let radius = layout.radius as f32;
    let sweep = REST_DEGREES - FULL_SCALE_DEGREES;

    let mut arc = [Point::zero(); ARC_STEPS + 1];
    for (i, p) in arc.iter_mut().enumerate() {
        let deg = REST_DEGREES - sweep * i as f32 / ARC_STEPS as f32;
        *p = polar(layout.pivot, radius, deg);
    }
    Polyline::new(&arc)
        .into_styled(PrimitiveStyle::with_stroke(Rgb565::CSS_LIGHT_GRAY, 2))
        .draw(target)?;

    let mut red = [Point::zero(); 7];
    for (i, p) in red.iter_mut().enumerate() {
        let deg = FULL_SCALE_DEGREES + RED_ZONE_DEGREES * i as f32 / 6.0;
        *p = polar(layout.pivot, radius - 3.0, deg);
    }
    Polyline::new(&red)
        .into_styled(PrimitiveStyle::with_stroke(Rgb565::RED, 4))
        .draw(target)?;

    for i in 0..MAJOR_TICKS {
        let deg = REST_DEGREES - sweep * i as f32 / (MAJOR_TICKS - 1) as f32;
        // The breakpoint tick is drawn longer.
        let inner = if libm::fabsf(deg - BREAKPOINT_DEGREES) < 0.5 {
            radius - 14.0
        } else {
            radius - 8.0
        };
        Line::new(polar(layout.pivot, inner, deg), polar(layout.pivot, radius, deg))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::WHITE, 2))
            .draw(target)?;
    }

    let label = MonoTextStyle::new(&FONT_6X10, Rgb565::CSS_YELLOW);
    let centered = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(
        "0",
        polar(layout.pivot, radius + LABEL_OFFSET, REST_DEGREES),
        label,
        centered,
    )
    .draw(target)?;
    Text::with_text_style(
        "MAX",
        polar(layout.pivot, radius + LABEL_OFFSET, FULL_SCALE_DEGREES),
        label,
        centered,
    )
    .draw(target)?;

    Circle::with_center(layout.pivot, 10)
        .into_styled(PrimitiveStyle::with_fill(Rgb565::CSS_DIM_GRAY))
        .draw(target)?;

    Ok(())
}

/// Page-level contract the controller drives.
pub trait GaugePage<D: DrawTarget> {
    /// Prepare the screen and the drawing resource. Called once per page visit.
    fn enter(&mut self, display: &mut D) -> Result<(), GaugeError<D::Error>>;

    /// Redraw the needle for `value`.
    fn render(&mut self, display: &mut D, value: Loudness) -> Result<(), GaugeError<D::Error>>;

    /// Release the drawing resource. Called once when the page is left.
    fn leave(&mut self);
}

/// The noise gauge page.
pub struct GaugeRenderer {
    layout: GaugeLayout,
    curve: NeedleCurve,
    free_bytes: fn() -> usize,
    aa_factor: u8,
    device: Option<AutoDevice>,
    creations: u32,
    destructions: u32,
}

impl GaugeRenderer {
    /// `free_bytes` reports the heap still available; it is checked before
    /// the drawing resource is allocated.
    pub const fn new(layout: GaugeLayout, curve: NeedleCurve, free_bytes: fn() -> usize) -> Self {
        Self {
            layout,
            curve,
            free_bytes,
            aa_factor: 1,
            device: None,
            creations: 0,
            destructions: 0,
        }
    }

    pub const fn is_live(&self) -> bool {
        self.device.is_some()
    }

    /// Number of times the drawing resource has been created.
    pub const fn creations(&self) -> u32 {
        self.creations
    }

    /// Number of times the drawing resource has been destroyed.
    pub const fn destructions(&self) -> u32 {
        self.destructions
    }

    fn check_memory<E>(&self) -> Result<usize, GaugeError<E>> {
        let free = (self.free_bytes)();
        if free < RECOMMENDED_MEMORY {
            warn!(
                "gauge refused: {=usize} bytes free, {=usize} required",
                free,
                RECOMMENDED_MEMORY
            );
            return Err(GaugeError::OutOfMemory {
                free,
                required: RECOMMENDED_MEMORY,
            });
        }
        Ok(free)
    }

    /// Clear the LCD, draw the page title, switch to anti-aliased needle
    /// rendering and create the drawing resource.
    ///
    /// Refuses without touching the screen when the heap is too small.
    pub fn init_page<D>(&mut self, display: &mut D) -> Result<(), GaugeError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.check_memory::<D::Error>()?;

        display.clear(Rgb565::BLACK).map_err(GaugeError::Display)?;

        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let center_x = (SCREEN_WIDTH / 2) as i32;
        Text::with_text_style(
            "Noise Level",
            Point::new(center_x, 3),
            MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE),
            centered,
        )
        .draw(display)
        .map_err(GaugeError::Display)?;
        Text::with_text_style(
            "Instant Microphone Detection",
            Point::new(center_x, 25),
            MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE),
            centered,
        )
        .draw(display)
        .map_err(GaugeError::Display)?;

        self.aa_factor = AA_FACTOR;
        self.acquire()
    }

    fn acquire<E>(&mut self) -> Result<(), GaugeError<E>> {
        if self.device.is_some() {
            return Ok(());
        }
        let free = self.check_memory::<E>()?;
        let device = AutoDevice::allocate(self.layout.area()).map_err(|_| {
            error!("gauge drawing resource allocation failed");
            GaugeError::OutOfMemory {
                free,
                required: RECOMMENDED_MEMORY,
            }
        })?;
        self.device = Some(device);
        self.creations += 1;
        debug!("gauge drawing resource created ({=u32})", self.creations);
        Ok(())
    }

    /// Redraw the needle for `value` and present the result atomically.
    pub fn render_needle<D>(&mut self, display: &mut D, value: Loudness) -> Result<(), GaugeError<D::Error>>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.acquire()?;
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };
        let area = self.layout.area();

        if device.draw_fixed {
            let Ok(()) = draw_scale(&mut device.background, &self.layout);
            device.frame.copy_area_from(&device.background, &area);
        }

        let angle = loudness_to_angle(value, self.curve);
        let needle = rotate_polygon(&NEEDLE_TEMPLATE, angle, Vertex::from(self.layout.pivot));

        let previous = device.needle_bounds.unwrap_or(Rectangle::zero());
        device.frame.copy_area_from(&device.background, &previous);
        let painted = fill_polygon_aa(&mut device.frame, &needle, Rgb565::WHITE, self.aa_factor);

        let dirty = if device.draw_fixed {
            area
        } else {
            union(&previous, &painted)
        };
        device.frame.present(display, &dirty).map_err(GaugeError::Display)?;

        trace!("needle at {} for loudness {}", angle, value.get());
        device.draw_fixed = false;
        device.needle_bounds = Some(painted);
        Ok(())
    }

    /// Free the drawing resource. Does nothing when it is not live.
    pub fn teardown_page(&mut self) {
        if self.device.take().is_some() {
            self.destructions += 1;
            debug!("gauge drawing resource freed ({=u32})", self.destructions);
        }
    }
}

impl<D> GaugePage<D> for GaugeRenderer
where
    D: DrawTarget<Color = Rgb565>,
{
    fn enter(&mut self, display: &mut D) -> Result<(), GaugeError<D::Error>> {
        self.init_page(display)
    }

    fn render(&mut self, display: &mut D, value: Loudness) -> Result<(), GaugeError<D::Error>> {
        self.render_needle(display, value)
    }

    fn leave(&mut self) {
        self.teardown_page();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestLcd;

    fn plenty() -> usize {
        1 << 20
    }

    fn starved() -> usize {
        1024
    }

    fn renderer(free_bytes: fn() -> usize) -> GaugeRenderer {
        GaugeRenderer::new(GaugeLayout::BADGE, NeedleCurve::Monotonic, free_bytes)
    }

    #[test]
    fn refuses_entry_without_memory() {
        let mut lcd = TestLcd::new();
        let mut gauge = renderer(starved);

        let err = gauge.init_page(&mut lcd).unwrap_err();
        assert_eq!(
            err,
            GaugeError::OutOfMemory {
                free: 1024,
                required: RECOMMENDED_MEMORY
            }
        );
        assert!(!gauge.is_live());
        assert_eq!(gauge.creations(), 0);
        assert_eq!(lcd.operations(), 0);
    }

    #[test]
    fn init_draws_title_and_creates_resource_once() {
        let mut lcd = TestLcd::new();
        let mut gauge = renderer(plenty);

        gauge.init_page(&mut lcd).unwrap();
        assert!(gauge.is_live());
        assert_eq!(gauge.creations(), 1);
        assert!(lcd.any_lit(&Rectangle::new(Point::zero(), Size::new(320, 36))));

        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();
        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();
        assert_eq!(gauge.creations(), 1);
    }

    #[test]
    fn first_render_presents_whole_gauge_then_only_the_needle() {
        let mut lcd = TestLcd::new();
        let mut gauge = renderer(plenty);
        gauge.init_page(&mut lcd).unwrap();

        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();
        assert_eq!(lcd.blits.last(), Some(&GaugeLayout::BADGE.area()));

        gauge.render_needle(&mut lcd, Loudness::new(3200)).unwrap();
        let dirty = *lcd.blits.last().unwrap();
        let area = GaugeLayout::BADGE.area();
        assert!(dirty.size.width * dirty.size.height < area.size.width * area.size.height);
        assert_eq!(dirty.intersection(&area), dirty);
    }

    #[test]
    fn needle_moves_between_rest_and_full_scale() {
        let mut lcd = TestLcd::new();
        let mut gauge = renderer(plenty);
        gauge.init_page(&mut lcd).unwrap();

        // 30 px from the pivot along the rest (225°) and full-scale (45°) rays.
        let on_rest_ray = Point::new(138, 124);
        let on_full_ray = Point::new(181, 81);

        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();
        assert_eq!(lcd.pixel(on_rest_ray), Rgb565::WHITE);
        assert_eq!(lcd.pixel(on_full_ray), Rgb565::BLACK);

        gauge.render_needle(&mut lcd, Loudness::MAX).unwrap();
        assert_eq!(lcd.pixel(on_full_ray), Rgb565::WHITE);
        assert_eq!(lcd.pixel(on_rest_ray), Rgb565::BLACK);
    }

    #[test]
    fn teardown_is_balanced_and_reacquire_redraws_scale() {
        let mut lcd = TestLcd::new();
        let mut gauge = renderer(plenty);
        gauge.init_page(&mut lcd).unwrap();
        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();

        gauge.teardown_page();
        gauge.teardown_page();
        assert!(!gauge.is_live());
        assert_eq!(gauge.destructions(), 1);

        gauge.render_needle(&mut lcd, Loudness::ZERO).unwrap();
        assert_eq!(gauge.creations(), 2);
        assert_eq!(lcd.blits.last(), Some(&GaugeLayout::BADGE.area()));
    }

    #[test]
    fn union_ignores_empty_rectangles() {
        let a = Rectangle::new(Point::new(2, 2), Size::new(3, 3));
        let b = Rectangle::new(Point::new(10, 1), Size::new(2, 2));
        assert_eq!(union(&a, &Rectangle::zero()), a);
        assert_eq!(union(&Rectangle::zero(), &b), b);
        assert_eq!(
            union(&a, &b),
            Rectangle::with_corners(Point::new(2, 1), Point::new(11, 4))
        );
    }
}
