//! W2_PASS depth=2: 16-byte-strip predictor feeding depth=1 (component G).
//!
//! The exact bit-level semantics of the strip1/strip2 three-state selection
//! and the `rel`-refresh schedule are stated only in prose in `spec.md` §4.G,
//! with no retained reference implementation to check against (see
//! `DESIGN.md`). This module follows that prose as literally as possible;
//! the specific choices made where it underdetermines behaviour (which
//! stream refreshes `rel`, how `strip2`'s mask bits compose with the
//! gb1-bit-driven tie-break) are recorded there.

use crate::bitreader::{BitReader, ByteReader};
use crate::error::{Error, Result};
use crate::frame::FrameView;
use crate::tables;
use crate::w2pass::depth1;
use alloc::vec::Vec;
use byteorder::{ByteOrder as _, LittleEndian};

pub fn decode(payload: &[u8], out: &mut FrameView<'_>) -> Result<()> {
    if payload.len() < 12 {
        return Err(Error::Invalid {
            why: "W2_PASS depth=2 payload smaller than its 12-byte header",
        });
    }

    let mut head = ByteReader::new(payload);
    let bsize = head.read_le32()?;
    let len1 = head.read_le32()?;
    let len2 = head.read_le32()?;

    if bsize < 16 {
        return Err(Error::Invalid {
            why: "W2_PASS depth=2 bsize below minimum strip size",
        });
    }

    let len1 = len1 as usize;
    let len2 = len2 as usize;
    let rest = &payload[12..];
    if rest.len() < len1 + len2 {
        return Err(Error::Invalid {
            why: "W2_PASS depth=2 substreams run past payload end",
        });
    }

    let mut gb1 = BitReader::new(&rest[..len1]);
    let mut gb2 = ByteReader::new(&rest[len1..len1 + len2]);
    let mut gb3 = ByteReader::new(&rest[len1 + len2..]);

    let mut buf = alloc::vec![0u8; bsize as usize];
    let mut rel: i64 = 1;

    strip1(&mut gb1, &mut gb2, &mut gb3, &mut buf, &mut rel)?;

    let full_strips_end = (bsize as usize) & !15;
    let mut d_pos = 16usize;
    while d_pos < full_strips_end {
        let kind = gb1.read_bit()?;
        if kind == 0 {
            let raw = gb1.read_bit()?;
            if raw == 0 {
                let src = gb3.read_buffer(16)?;
                buf[d_pos..d_pos + 16].copy_from_slice(src);
            } else {
                let src_pos = checked_rel_offset(d_pos, rel, 16)?;
                buf.copy_within(src_pos..src_pos + 16, d_pos);
            }
        } else {
            strip2(&mut gb1, &mut gb2, &mut gb3, &mut buf, d_pos, &mut rel)?;
        }
        d_pos += 16;
    }

    let tail_len = (bsize as usize) - full_strips_end;
    if tail_len > 0 {
        let tail = gb2.read_buffer(tail_len)?;
        buf[full_strips_end..].copy_from_slice(tail);
    }

    depth1::decode(&buf, out)
}

fn checked_rel_offset(d_pos: usize, rel: i64, len: usize) -> Result<usize> {
    let _ = len;
    let src = d_pos as i64 - rel * 2;
    if src < 0 {
        return Err(Error::Invalid {
            why: "W2_PASS depth=2 strip offset before start of buffer",
        });
    }
    Ok(src as usize)
}

fn read_le16_at(buf: &[u8], pos: usize) -> Result<u16> {
    buf.get(pos..pos + 2)
        .map(LittleEndian::read_u16)
        .ok_or(Error::Invalid {
            why: "W2_PASS depth=2 LE16 read out of range",
        })
}

/// The three-state value decision shared by `strip1`'s trailing values and
/// `strip2`'s pixels. Returns the decoded value and whether the first
/// (copy-from-`rel`) branch was *not* taken, i.e. whether a `rel` refresh is
/// due at an even index per `spec.md` §4.G.
fn decide_value(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    gb3: &mut ByteReader<'_>,
    buf: &[u8],
    pos: usize,
    rel: i64,
) -> Result<(u16, bool)> {
    if gb1.read_bit()? == 1 {
        let src = checked_rel_offset(pos, rel, 2)?;
        return Ok((read_le16_at(buf, src)?, false));
    }

    if gb1.read_bit()? == 0 {
        let prev = read_le16_at(buf, pos.checked_sub(2).ok_or(Error::Invalid {
            why: "W2_PASS depth=2 XOR predictor before start of buffer",
        })?)?;
        let b = gb2.read_u8()?;
        Ok((prev ^ tables::QMAGE_DIFF[usize::from(b)], true))
    } else {
        Ok((gb3.read_le16()?, true))
    }
}

fn refresh_rel(gb2: &mut ByteReader<'_>, rel: &mut i64) -> Result<()> {
    *rel = 1 + i64::from(gb2.read_u8()?);
    Ok(())
}

fn strip1(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    gb3: &mut ByteReader<'_>,
    buf: &mut [u8],
    rel: &mut i64,
) -> Result<()> {
    let literal = gb3.read_le32()?;
    buf[0..4].copy_from_slice(&literal.to_le_bytes());

    for local_idx in 0..6usize {
        let pos = 4 + local_idx * 2;
        let (value, refresh_due) = decide_value(gb1, gb2, gb3, buf, pos, *rel)?;
        if local_idx % 2 == 0 && refresh_due {
            refresh_rel(gb2, rel)?;
        }
        buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    }

    Ok(())
}

fn strip2(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    gb3: &mut ByteReader<'_>,
    buf: &mut [u8],
    d_pos: usize,
    rel: &mut i64,
) -> Result<()> {
    let mask = gb2.read_u8()?;

    for i in 0..8usize {
        let pos = d_pos + i * 2;
        let forced_copy = (mask >> i) & 1 == 1;

        let (value, refresh_due) = if forced_copy {
            let src = checked_rel_offset(pos, *rel, 2)?;
            (read_le16_at(buf, src)?, false)
        } else {
            decide_value(gb1, gb2, gb3, buf, pos, *rel)?
        };

        if i % 2 == 0 && refresh_due {
            refresh_rel(gb2, rel)?;
        }

        buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    }

    Ok(())
}
