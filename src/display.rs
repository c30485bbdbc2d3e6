//! ST7789 display driver: 320×170 LCD over SPI with DMA.
//!
//! Every gauge, page and error screen in this crate draws through the
//! `embedded-graphics` `DrawTarget` this module builds. The panel comes up
//! cleared to black, so nothing stale shows once the backlight turns on.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async,
    delay::Delay,
    dma::{
        DmaRxBuf,
        DmaTxBuf,
    },
    dma_buffers,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    spi::master::{
        Config,
        Spi,
        SpiDmaBus,
    },
    time::Rate,
};
use mipidsi::{
    Builder,
    models::ST7789,
    options::{
        ColorInversion,
        Orientation,
        Rotation,
    },
};

use crate::{
    DisplayResources,
    config::{
        SCREEN_HEIGHT,
        SCREEN_WIDTH,
    },
    gauge::GaugeLayout,
    mk_static,
    offscreen::OffscreenBuffer,
};

/// DMA bounce buffers for the SPI bus.
const DMA_BUFFER_SIZE: usize = 32000;

/// Pixel staging buffer: one whole gauge frame goes out in a single pass.
const STAGING_SIZE: usize = OffscreenBuffer::byte_size(GaugeLayout::BADGE.size);

const SPI_CLOCK_MHZ: u32 = 80;

/// Panel rows hidden behind the bezel above the visible 170.
const PANEL_OFFSET: u16 = 35;

type PanelDevice<'a> = ExclusiveDevice<SpiDmaBus<'a, Async>, Output<'a>, Delay>;

type SpiInterface<'a> = mipidsi::interface::SpiInterface<'a, PanelDevice<'a>, Output<'a>>;

/// The badge's ST7789 display, ready to draw on with `embedded-graphics`.
pub type Display<'a> = mipidsi::Display<SpiInterface<'a>, ST7789, Output<'a>>;

/// Landscape, with the buttons on the short edges.
fn landscape() -> Orientation {
    Orientation::new().rotate(Rotation::Deg90)
}

fn panel_device(res: DisplayResources<'static>, delay: Delay) -> (PanelDevice<'static>, Output<'static>, Output<'static>) {
    let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(DMA_BUFFER_SIZE);
    let dma_rx_buf = DmaRxBuf::new(rx_descriptors, rx_buffer).unwrap();
    let dma_tx_buf = DmaTxBuf::new(tx_descriptors, tx_buffer).unwrap();

    let dc = Output::new(res.dc, Level::Low, OutputConfig::default());
    let mut rst = Output::new(res.rst, Level::Low, OutputConfig::default());
    rst.set_high();

    let bus = Spi::new(res.spi, Config::default().with_frequency(Rate::from_mhz(SPI_CLOCK_MHZ)))
        .unwrap()
        .with_sck(res.sck)
        .with_mosi(res.mosi)
        .with_miso(res.miso)
        .with_dma(res.dma)
        .with_buffers(dma_rx_buf, dma_tx_buf)
        .into_async();

    let cs = Output::new(res.cs, Level::High, OutputConfig::default());
    (ExclusiveDevice::new(bus, cs, delay).unwrap(), dc, rst)
}

impl From<DisplayResources<'static>> for Display<'static> {
    fn from(res: DisplayResources<'static>) -> Self {
        let (device, dc, rst) = panel_device(res, Delay::new());
        let mut delay = Delay::new();

        let staging = mk_static!([u8; STAGING_SIZE], [0_u8; STAGING_SIZE]);
        let interface = mipidsi::interface::SpiInterface::new(device, dc, staging);

        let mut display = Builder::new(ST7789, interface)
            .reset_pin(rst)
            .display_size(SCREEN_HEIGHT as u16, SCREEN_WIDTH as u16)
            .invert_colors(ColorInversion::Inverted)
            .orientation(landscape())
            .display_offset(PANEL_OFFSET, 0)
            .init(&mut delay)
            .unwrap();
        display.clear(Rgb565::BLACK).unwrap();

        info!("display ready: {=u32}x{=u32}", SCREEN_WIDTH, SCREEN_HEIGHT);
        display
    }
}
