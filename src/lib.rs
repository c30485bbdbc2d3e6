//! # noise-gauge
//!
//! Microphone noise-level gauge for the Disobey 2026 badge.
//!
//! The badge samples the I2S microphone one frame at a time, turns each frame
//! into a loudness value and shows it as an analog needle on the LCD. Two
//! buttons page through the screens; the gauge only holds its off-screen
//! buffers while its page is visible.
//!
//! The pipeline is hardware-agnostic and runs on the host:
//! - **level**: frame → loudness
//! - **needle**: loudness → angle, needle polygon and anti-aliased fill
//! - **gauge**: double-buffered gauge page
//! - **controller**: page state machine driving touch, audio and redraw
//!
//! With the `badge` feature the crate also brings up the board:
//! - **Display**: 320×170 ST7789 LCD over SPI with DMA
//! - **Buttons**: left/right as the two touch navigation buttons
//! - **Microphone**: I2S MEMS microphone input
//! - **Backlight**: display backlight control
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let peripherals = noise_gauge::init();
//! let resources = noise_gauge::split_resources!(peripherals);
//!
//! let mut display: noise_gauge::Display = resources.display.into();
//! let mut buttons: noise_gauge::TouchButtons = resources.buttons.into();
//! let gauge = GaugeRenderer::new(GaugeLayout::BADGE, NeedleCurve::Monotonic, heap::free_bytes);
//! let mut controller = PageController::new(gauge);
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod audio;
pub mod config;
pub mod controller;
pub mod gauge;
pub mod level;
pub mod needle;
pub mod offscreen;
pub mod pages;
pub mod touch;

#[cfg(test)]
mod testing;

#[cfg(feature = "badge")]
mod backlight;
#[cfg(feature = "badge")]
mod buttons;
#[cfg(feature = "badge")]
mod display;
#[cfg(feature = "badge")]
pub mod heap;
#[cfg(feature = "badge")]
pub mod microphone;

pub use audio::{
    AudioSource,
    FrameLink,
};
#[cfg(feature = "badge")]
pub use backlight::Backlight;
#[cfg(feature = "badge")]
pub use buttons::TouchButtons;
pub use controller::PageController;
#[cfg(feature = "badge")]
pub use display::Display;
pub use gauge::{
    GaugeError,
    GaugeLayout,
    GaugePage,
    GaugeRenderer,
};
pub use level::{
    AudioFrame,
    Loudness,
    estimate_loudness,
};
#[cfg(feature = "badge")]
pub use microphone::Microphone;
pub use needle::{
    NeedleCurve,
    loudness_to_angle,
};
pub use pages::Page;
pub use touch::{
    TouchButton,
    TouchSensor,
};

/// StaticCell helper: allocates a value into a `static` exactly once.
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}

#[cfg(feature = "badge")]
use esp_hal::{
    assign_resources,
    clock::{
        Clock,
        CpuClock,
    },
    rom,
};

// ── Pin / peripheral assignments ────────────────────────────────────────────

#[cfg(feature = "badge")]
assign_resources! {
    pub Resources<'d> {
        display: DisplayResources<'d> {
            dc: GPIO15,
            rst: GPIO7,
            sck: GPIO4,
            cs: GPIO6,
            miso: GPIO16,
            mosi: GPIO5,
            spi: SPI2,
            dma: DMA_CH0,
        },
        backlight: BacklightResources<'d> {
            led: GPIO19,
        },
        buttons: ButtonResources<'d> {
            left: GPIO21,
            right: GPIO2,
        },
        mic: MicResources<'d> {
            ws: GPIO8,
            sd: GPIO3,
            dio: GPIO46,
            i2s: I2S0,
            dma: DMA_CH1,
        }
    }
}

// ── Board initialisation ────────────────────────────────────────────────────

/// Minimal CPU clock switcher for ESP32-S3.
///
/// Steps through an intermediate frequency before reaching the target,
/// which is required by the hardware.
#[cfg(feature = "badge")]
fn set_cpu_clock(cpu_clock_speed: CpuClock) {
    let _ = esp_hal::peripherals::SYSTEM::regs()
        .sysclk_conf()
        .modify(|_, w| unsafe { w.soc_clk_sel().bits(1) });
    let _ = esp_hal::peripherals::SYSTEM::regs()
        .cpu_per_conf()
        .modify(|_, w| unsafe {
            let _ = w.pll_freq_sel().set_bit();
            w.cpuperiod_sel().bits(match cpu_clock_speed {
                CpuClock::_80MHz => 0,
                CpuClock::_160MHz => 1,
                CpuClock::_240MHz => 2,
                _ => panic!("Unsupported CPU clock speed"),
            })
        });

    rom::ets_update_cpu_frequency_rom(cpu_clock_speed.frequency().as_mhz());
}

/// Initialise the badge hardware and return the raw peripheral set.
///
/// Call this once at the top of `main`, then [`split_resources!`] the
/// peripherals into typed resource groups. Bring-up failures panic and halt
/// through `esp-backtrace`; there is no degraded mode.
#[cfg(feature = "badge")]
#[must_use]
pub fn init() -> esp_hal::peripherals::Peripherals {
    set_cpu_clock(CpuClock::_160MHz);
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    esp_hal::init(config)
}
