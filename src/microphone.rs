//! I2S MEMS microphone driver.
//!
//! The badge has an I2S microphone connected via:
//! - WS (word select / LRCLK) on GPIO8
//! - SD (serial data / DIN) on GPIO3
//! - DIO (bit clock / BCLK) on GPIO46
//!
//! Samples arrive over DMA, one [`AudioFrame`] per read. Reads are async so
//! the executor keeps drawing while a frame is captured.

use esp_hal::{
    Async,
    dma::DmaDescriptor,
    i2s::master::{
        Channels,
        Config,
        DataFormat,
        Error,
        I2s,
        I2sRx,
    },
    time::Rate,
};

use crate::{
    MicResources,
    config::FRAME_SIZE,
    level::AudioFrame,
};

/// Little-endian 16-bit mono samples, as the DMA engine writes them.
const FRAME_BYTES: usize = FRAME_SIZE * 2;

/// I2S microphone, ready for DMA reads.
pub struct Microphone<'a> {
    rx: I2sRx<'a, Async>,
    raw: [u8; FRAME_BYTES],
}

impl<'a> Microphone<'a> {
    /// Create a new microphone from raw resources and a static descriptor slice.
    ///
    /// `sample_rate` is in Hz (see [`SAMPLE_RATE_HZ`](crate::config::SAMPLE_RATE_HZ)).
    /// `descriptors` must be a `&'static mut` slice; use [`mk_static!`](crate::mk_static)
    /// or a static array.
    pub fn new(
        res: MicResources<'a>,
        sample_rate: u32,
        descriptors: &'static mut [DmaDescriptor],
    ) -> Self {
        let i2s = I2s::new(
            res.i2s,
            res.dma,
            Config::new_tdm_philips()
                .with_sample_rate(Rate::from_hz(sample_rate))
                .with_data_format(DataFormat::Data16Channel16)
                .with_channels(Channels::MONO),
        )
        .unwrap()
        .into_async();

        let rx = i2s
            .i2s_rx
            .with_bclk(res.dio)
            .with_ws(res.ws)
            .with_din(res.sd)
            .build(descriptors);

        Self {
            rx,
            raw: [0; FRAME_BYTES],
        }
    }

    /// Capture the next block of samples into `frame`.
    pub async fn read_frame(&mut self, frame: &mut AudioFrame) -> Result<(), Error> {
        self.rx.read_dma_async(&mut self.raw).await?;
        for (sample, bytes) in frame.iter_mut().zip(self.raw.chunks_exact(2)) {
            *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        }
        Ok(())
    }
}
