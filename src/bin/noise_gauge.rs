//! Noise gauge firmware.
//!
//! Boots on the splash page. LEFT steps back a page, RIGHT steps forward;
//! page 1 shows the live microphone level on an analog gauge.
//!
//! The microphone task only fills frames on request and hands them over
//! through a [`FrameLink`]; every draw and every button evaluation happens in
//! the main loop.

#![no_std]
#![no_main]

use defmt::{
    error,
    info,
};
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Ticker,
    Timer,
};
use esp_backtrace as _;
use esp_hal::{
    dma::DmaDescriptor,
    timer::timg::TimerGroup,
};
use esp_println as _;
#[allow(clippy::wildcard_imports)]
use noise_gauge::*;
use noise_gauge::config::{
    FRAME_SIZE,
    HEAP_SIZE,
    SAMPLE_RATE_HZ,
    SCAN_PERIOD_MS,
};

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

static FRAMES: FrameLink = FrameLink::new();

#[embassy_executor::task]
async fn mic_task(mic: &'static mut Microphone<'static>, link: &'static FrameLink) {
    info!("Microphone task started, waiting for frame requests");

    let mut frame: AudioFrame = [0; FRAME_SIZE];
    loop {
        link.wait_request().await;
        loop {
            match mic.read_frame(&mut frame).await {
                Ok(()) => {
                    link.complete(frame);
                    break;
                }
                Err(e) => {
                    error!("Microphone read failed: {}", e);
                    Timer::after(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = noise_gauge::init();
    let resources = split_resources!(peripherals);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let mut display: Display<'static> = resources.display.into();
    let mut backlight: Backlight = resources.backlight.into();
    let mut buttons: TouchButtons = resources.buttons.into();

    let descriptors = mk_static!([DmaDescriptor; 8], [DmaDescriptor::EMPTY; 8]);
    let mic = mk_static!(
        Microphone<'static>,
        Microphone::new(resources.mic, SAMPLE_RATE_HZ, descriptors)
    );
    spawner.must_spawn(mic_task(mic, &FRAMES));

    let gauge = GaugeRenderer::new(GaugeLayout::BADGE, NeedleCurve::Monotonic, heap::free_bytes);
    let mut controller = PageController::new(gauge);
    controller.start(&mut display, &mut buttons).unwrap();
    backlight.on();

    let mut audio = &FRAMES;
    let mut ticker = Ticker::every(Duration::from_millis(SCAN_PERIOD_MS));
    loop {
        controller
            .run_cycle(&mut display, &mut buttons, &mut audio)
            .unwrap();
        ticker.next().await;
    }
}
