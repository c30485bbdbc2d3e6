//! Left/right badge buttons as the two-button touch panel.
//!
//! The GPIOs are sampled once per main-loop scan. A state change is only
//! accepted after [`DEBOUNCE_SCANS`] identical samples, so with the scan
//! period the debounce window matches the badge's mechanical bounce.

use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};

use crate::{
    ButtonResources,
    config::DEBOUNCE_SCANS,
    touch::{
        TouchButton,
        TouchSensor,
    },
};

#[derive(Default, Clone, Copy)]
struct Debounced {
    raw: bool,
    stable_for: u8,
    state: bool,
}

impl Debounced {
    fn sample(&mut self, pressed: bool) {
        if pressed == self.raw {
            self.stable_for = self.stable_for.saturating_add(1);
        } else {
            self.raw = pressed;
            self.stable_for = 1;
        }
    }

    fn settle(&mut self) {
        if self.stable_for >= DEBOUNCE_SCANS {
            self.state = self.raw;
        }
    }
}

/// Two active-low buttons exposed through [`TouchSensor`].
pub struct TouchButtons {
    left: Input<'static>,
    right: Input<'static>,
    widgets: [Debounced; 2],
}

impl From<ButtonResources<'static>> for TouchButtons {
    fn from(res: ButtonResources<'static>) -> Self {
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        Self {
            left: Input::new(res.left, pull_up),
            right: Input::new(res.right, pull_up),
            widgets: [Debounced::default(); 2],
        }
    }
}

impl TouchSensor for TouchButtons {
    /// GPIO sampling completes immediately.
    fn scan_all_widgets(&mut self) {
        self.widgets[TouchButton::Button0 as usize].sample(self.left.is_low());
        self.widgets[TouchButton::Button1 as usize].sample(self.right.is_low());
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn process_all_widgets(&mut self) {
        for widget in &mut self.widgets {
            widget.settle();
        }
    }

    fn is_sensor_active(&self, button: TouchButton) -> bool {
        self.widgets[button as usize].state
    }
}
