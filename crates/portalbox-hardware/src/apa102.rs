//! APA102 / SK9822 ("Dotstar") frame encoding.
//!
//! A frame is a 4-byte zero start frame, one 4-byte record per pixel
//! (`0xE0 | brightness` followed by the color bytes in the strip's channel
//! order), a 4-byte zero SK9822 reset frame, and `len / 16 + 1` zero bytes
//! to clock the data through the whole strip.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use portalbox_core::constants::MAX_BRIGHTNESS;
use tracing::trace;

use crate::{
    HardwareError, Result,
    traits::LedStrip,
    types::{ColorOrder, Pixel},
};

const START_FRAME_LEN: usize = 4;
const RESET_FRAME_LEN: usize = 4;
const PIXEL_HEADER: u8 = 0xE0;

/// Number of bytes in an encoded frame for `len` pixels.
#[must_use]
pub fn frame_len(len: usize) -> usize {
    START_FRAME_LEN + len * 4 + RESET_FRAME_LEN + len / 16 + 1
}

/// Encode a pixel buffer into the SPI byte stream.
///
/// Brightness is clamped to the 5-bit field.
///
/// # Examples
///
/// ```
/// use portalbox_core::Rgb;
/// use portalbox_hardware::apa102::encode_frame;
/// use portalbox_hardware::types::{ColorOrder, Pixel};
///
/// let frame = encode_frame(&[Pixel::new(Rgb::new(1, 2, 3), 16)], ColorOrder::Brg);
/// assert_eq!(&frame[..4], &[0, 0, 0, 0]);
/// assert_eq!(&frame[4..8], &[0xF0, 3, 2, 1]);
/// ```
#[must_use]
pub fn encode_frame(pixels: &[Pixel], order: ColorOrder) -> Bytes {
    let mut buf = BytesMut::with_capacity(frame_len(pixels.len()));
    buf.put_bytes(0x00, START_FRAME_LEN);
    for pixel in pixels {
        buf.put_u8(PIXEL_HEADER | pixel.brightness.min(MAX_BRIGHTNESS));
        buf.put_slice(&order.arrange(pixel.color));
    }
    buf.put_bytes(0x00, RESET_FRAME_LEN);
    buf.put_bytes(0x00, pixels.len() / 16 + 1);
    buf.freeze()
}

/// LED strip that writes encoded frames to any byte sink.
///
/// On the box the sink is the SPI device node; tests use a `Vec<u8>`.
#[derive(Debug)]
pub struct WriterStrip<W> {
    writer: W,
    len: usize,
    order: ColorOrder,
}

impl<W: Write + Send> WriterStrip<W> {
    /// Create a strip of `len` pixels.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `len` is zero.
    pub fn new(writer: W, len: usize, order: ColorOrder) -> Result<Self> {
        if len == 0 {
            return Err(HardwareError::configuration("LED strip length is zero"));
        }
        Ok(Self { writer, len, order })
    }

    /// Consume the strip and return the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LedStrip for WriterStrip<W> {
    fn len(&self) -> usize {
        self.len
    }

    fn show(&mut self, pixels: &[Pixel]) -> Result<()> {
        HardwareError::check_frame(self.len, pixels.len())?;
        let frame = encode_frame(pixels, self.order);
        trace!("Writing {} byte LED frame", frame.len());
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }
}
