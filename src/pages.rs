//! Page index and the static screens that need no per-cycle refresh.

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

use crate::config::{
    SCREEN_HEIGHT,
    SCREEN_WIDTH,
};

/// Number of pages reachable with the touch buttons.
pub const NUMBER_OF_PAGES: usize = 5;

/// Screens in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    /// Splash screen shown at power-on.
    Logo = 0,
    /// Microphone noise gauge.
    Noise = 1,
    /// Ambient light level.
    Light = 2,
    /// Cloud connection status.
    Aws = 3,
    /// Control center event log.
    Center = 4,
}

impl Page {
    /// The page that owns the gauge drawing resource.
    pub const GAUGE: Self = Self::Noise;

    const ALL: [Self; NUMBER_OF_PAGES] = [
        Self::Logo,
        Self::Noise,
        Self::Light,
        Self::Aws,
        Self::Center,
    ];

    /// Page at `index`, wrapped into range.
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % NUMBER_OF_PAGES]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub const fn previous(self) -> Self {
        Self::from_index(self.index() + NUMBER_OF_PAGES - 1)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Logo => "Noise Gauge",
            Self::Noise => "Noise Level",
            Self::Light => "Environment Light Level",
            Self::Aws => "AWS MQTT Status",
            Self::Center => "Control Center Log",
        }
    }
}

fn clear<D>(display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::BLACK))
        .draw(display)
}

/// Draw a page that is fully described by its title.
///
/// The gauge page is drawn by the gauge renderer and is left alone here.
pub fn draw_static_page<D>(display: &mut D, page: Page) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    match page {
        Page::Noise => Ok(()),
        Page::Logo => {
            clear(display)?;
            let centered = TextStyleBuilder::new()
                .alignment(Alignment::Center)
                .baseline(Baseline::Middle)
                .build();
            let mid = (SCREEN_WIDTH / 2) as i32;
            Text::with_text_style(
                page.title(),
                Point::new(mid, 70),
                MonoTextStyle::new(&FONT_10X20, Rgb565::CSS_ORANGE),
                centered,
            )
            .draw(display)?;
            Text::with_text_style(
                "< touch to change page >",
                Point::new(mid, 110),
                MonoTextStyle::new(&FONT_6X10, Rgb565::CSS_GRAY),
                centered,
            )
            .draw(display)?;
            Ok(())
        }
        Page::Light | Page::Aws | Page::Center => {
            clear(display)?;
            Text::with_baseline(
                page.title(),
                Point::new(50, 10),
                MonoTextStyle::new(&FONT_10X20, Rgb565::CSS_GRAY),
                Baseline::Top,
            )
            .draw(display)?;
            Ok(())
        }
    }
}

/// Shown instead of the gauge when its drawing resource cannot be allocated.
pub fn draw_memory_error<D>(display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    clear(display)?;
    Text::with_text_style(
        "Not enough memory available.",
        Point::new((SCREEN_WIDTH / 2) as i32, (SCREEN_HEIGHT / 2) as i32),
        MonoTextStyle::new(&FONT_10X20, Rgb565::RED),
        TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build(),
    )
    .draw(display)?;
    Ok(())
}
