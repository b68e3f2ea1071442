//! Tokio codec for newline-delimited effect commands.
//!
//! The standalone driver processes read one command per line on standard
//! input. [`EffectLineCodec`] frames those lines for `FramedRead` /
//! `FramedWrite` and parses them into [`LightCommand`] or [`SoundCommand`].
//!
//! A malformed line is not a stream error: the decoder yields
//! `Some(Err(CommandError))` for it so the caller can report the error
//! number and keep reading. Only I/O failures and over-long lines end the
//! stream.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use portalbox_effects::{EffectLineCodec, LightCommand};
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = EffectLineCodec::<LightCommand>::new();
//! let mut buf = BytesMut::from("color 255 0 0\nglow 1 2 3\npulse 0 0");
//!
//! assert!(matches!(codec.decode(&mut buf), Ok(Some(Ok(LightCommand::Color { .. })))));
//! assert!(matches!(codec.decode(&mut buf), Ok(Some(Err(e))) if e.code() == 1));
//! // incomplete line stays buffered
//! assert!(matches!(codec.decode(&mut buf), Ok(None)));
//! ```
//!
//! [`LightCommand`]: crate::LightCommand
//! [`SoundCommand`]: crate::SoundCommand

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{CodecError, CommandError};

/// Longest accepted command line, in bytes.
const DEFAULT_MAX_LINE_LEN: usize = 4 * 1024;

/// Line codec for one command type.
#[derive(Debug)]
pub struct EffectLineCodec<C> {
    max_line_len: usize,
    _command: PhantomData<fn() -> C>,
}

impl<C> EffectLineCodec<C> {
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            max_line_len,
            _command: PhantomData,
        }
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }
}

impl<C> Default for EffectLineCodec<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EffectLineCodec<C>
where
    C: FromStr<Err = CommandError>,
{
    fn parse_line(line: &[u8]) -> Option<Result<C, CommandError>> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(text.parse())
    }
}

impl<C> Decoder for EffectLineCodec<C>
where
    C: FromStr<Err = CommandError>,
{
    type Item = Result<C, CommandError>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(newline) = src.iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_line_len {
                    return Err(CodecError::LineTooLong {
                        max: self.max_line_len,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(newline + 1);
            if let Some(item) = Self::parse_line(&line[..newline]) {
                return Ok(Some(item));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        let rest = src.split();
        Ok(Self::parse_line(&rest))
    }
}

impl<C: fmt::Display> Encoder<C> for EffectLineCodec<C> {
    type Error = CodecError;

    fn encode(&mut self, item: C, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.to_string();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
