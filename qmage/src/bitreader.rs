//! Low-level cursors over a Qmage packet.
//!
//! Two independent reader kinds share the same backing slice but keep their
//! own cursor: [`BitReader`] pulls bits MSB-first, [`ByteReader`] reads
//! sequential byte-aligned little-endian values. Multiple readers of either
//! kind can be active over disjoint regions of one packet at once; neither
//! type ever reads past the slice it was built from.

use crate::error::{EndOfStreamSnafu, Error};
use byteorder::{ByteOrder as _, LittleEndian};
use snafu::ensure;

/// MSB-first bit reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    // Bit position from the start of `data`.
    pos: usize,
}

impl<'a> BitReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn bits_left(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Reads a single bit (0 or 1).
    #[inline]
    pub fn read_bit(&mut self) -> Result<u8, Error> {
        ensure!(self.bits_left() >= 1, EndOfStreamSnafu);

        let byte = self.data[self.pos / 8];
        let shift = 7 - (self.pos % 8);
        self.pos += 1;

        Ok((byte >> shift) & 1)
    }

    /// Reads `n` bits (1..=16) as an unsigned value, MSB first.
    pub fn read_bits(&mut self, n: u32) -> Result<u16, Error> {
        debug_assert!((1..=16).contains(&n));
        ensure!(self.bits_left() >= n as usize, EndOfStreamSnafu);

        let mut value: u32 = 0;
        for _ in 0..n {
            let byte = self.data[self.pos / 8];
            let shift = 7 - (self.pos % 8);
            value = (value << 1) | u32::from((byte >> shift) & 1);
            self.pos += 1;
        }

        Ok(value as u16)
    }

    /// Skips `n` bits without decoding them.
    #[inline]
    pub fn skip_bits(&mut self, n: usize) -> Result<(), Error> {
        ensure!(self.bits_left() >= n, EndOfStreamSnafu);
        self.pos += n;
        Ok(())
    }
}

/// Sequential, bounds-checked byte-aligned cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn bytes_left(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.data.get(self.pos).copied().ok_or(Error::EndOfStream)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    pub fn read_le16(&mut self) -> Result<u16, Error> {
        let buf = self.read_buffer(2)?;
        Ok(LittleEndian::read_u16(buf))
    }

    #[inline]
    pub fn read_le32(&mut self) -> Result<u32, Error> {
        let buf = self.read_buffer(4)?;
        Ok(LittleEndian::read_u32(buf))
    }

    #[inline]
    pub fn read_buffer(&mut self, n: usize) -> Result<&'a [u8], Error> {
        ensure!(self.bytes_left() >= n, EndOfStreamSnafu);
        let buf = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(buf)
    }

    #[inline]
    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        ensure!(self.bytes_left() >= n, EndOfStreamSnafu);
        self.pos += n;
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// `read_value` as used by W2_PASS: an unbounded varint where `0xFF` bytes
/// accumulate and the terminating byte (which may itself be `0xFF` is not
/// possible, since it would keep accumulating) is added to the running sum.
pub fn read_value(r: &mut ByteReader<'_>) -> Result<u32, Error> {
    let mut total: u32 = 0;
    loop {
        let b = r.read_u8()?;
        total += u32::from(b);
        if b != 0xFF {
            break;
        }
    }
    Ok(total)
}
