//! Display backlight control.

use esp_hal::gpio::{
    Level,
    Output,
    OutputConfig,
};

use crate::BacklightResources;

/// Controls the display backlight LED.
pub struct Backlight {
    pin: Output<'static>,
}

impl From<BacklightResources<'static>> for Backlight {
    fn from(res: BacklightResources<'static>) -> Self {
        // Stay dark until the first page has been drawn.
        Self {
            pin: Output::new(res.led, Level::Low, OutputConfig::default()),
        }
    }
}

impl Backlight {
    pub fn on(&mut self) {
        self.pin.set_high();
    }
}
