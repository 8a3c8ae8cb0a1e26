//! W2_PASS depth=1: run/dictionary decode over 32-bit units (component F).

use crate::bitreader::{read_value, ByteReader};
use crate::error::{Error, Result};
use crate::frame::FrameView;
use byteorder::{ByteOrder as _, LittleEndian};

/// Decodes a depth=1 payload (the bytes immediately after `header_size`) into
/// `out`.
pub fn decode(payload: &[u8], out: &mut FrameView<'_>) -> Result<()> {
    let size = payload.len() as u32;
    if size < 16 {
        return Err(Error::Invalid {
            why: "W2_PASS depth=1 payload smaller than its 16-byte header",
        });
    }

    let mut head = ByteReader::new(payload);
    let cnt_table = head.read_le32()?;
    let size_idx = head.read_le32()?;
    let size_run = head.read_le32()?;
    let _reserved = head.read_le32()?;

    let dict_len = cnt_table
        .checked_mul(4)
        .ok_or(Error::Invalid { why: "dictionary size overflow" })?;
    let start1 = 16u32
        .checked_add(dict_len)
        .ok_or(Error::Invalid { why: "dictionary runs past payload" })?;
    let start2 = start1
        .checked_add(size_idx)
        .ok_or(Error::Invalid { why: "size_idx overflow" })?;
    let start3 = start2
        .checked_add(size_run)
        .ok_or(Error::Invalid { why: "size_run overflow" })?;

    if start3 > size {
        return Err(Error::Invalid {
            why: "W2_PASS depth=1 substreams run past payload end",
        });
    }

    let dict = &payload[16..start1 as usize];
    let mut gb1 = ByteReader::new(&payload[start1 as usize..start2 as usize]);
    let mut gb2 = ByteReader::new(&payload[start2 as usize..start3 as usize]);
    let mut gb3 = ByteReader::new(&payload[start3 as usize..]);

    let aligned = out.linesize == usize::from(out.width) * 2;
    let dim = usize::from(out.width) * usize::from(out.height) * 2;

    let mut cursor = if aligned {
        Cursor::Aligned { pos: 0, dim }
    } else {
        Cursor::Unaligned {
            x: 0,
            y: 0,
            width: out.width,
            height: out.height,
        }
    };

    while !cursor.is_done() {
        let idx = read_value(&mut gb1)?;

        if idx == 0 {
            let literal = gb3.read_le32()?;
            cursor.emit_u32(out, literal);
            continue;
        }

        let idx_end = idx
            .checked_mul(4)
            .and_then(|v| v.checked_add(4))
            .ok_or(Error::Invalid {
                why: "W2_PASS depth=1 dictionary index overflow",
            })?;
        if idx_end > size.saturating_sub(16) {
            return Err(Error::Invalid {
                why: "W2_PASS depth=1 dictionary index out of range",
            });
        }

        let dict_index = (idx - 1) as usize;
        let off = dict_index * 4;
        let entry = dict
            .get(off..off + 4)
            .ok_or(Error::Invalid { why: "dictionary index past dictionary table" })?;
        let entry = LittleEndian::read_u32(entry);

        let run = read_value(&mut gb2)? + 1;
        for _ in 0..run {
            if cursor.is_done() {
                break;
            }
            cursor.emit_u32(out, entry);
        }
    }

    Ok(())
}

/// Tracks where the next 32-bit unit lands, in either of the two §4.F output
/// modes.
enum Cursor {
    /// `dst_linesize == width*2`: a contiguous byte run.
    Aligned { pos: usize, dim: usize },
    /// Otherwise: two LE16 pixels per unit, placed cell by cell with row wrap.
    Unaligned {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },
}

impl Cursor {
    fn is_done(&self) -> bool {
        match self {
            Cursor::Aligned { pos, dim } => pos >= dim,
            Cursor::Unaligned { y, height, .. } => y >= height,
        }
    }

    fn emit_u32(&mut self, out: &mut FrameView<'_>, unit: u32) {
        match self {
            Cursor::Aligned { pos, dim } => {
                if *pos >= *dim {
                    return;
                }
                let bytes = unit.to_le_bytes();
                let n = (*dim - *pos).min(4);
                out.cur[*pos..*pos + n].copy_from_slice(&bytes[..n]);
                *pos += n;
            }
            Cursor::Unaligned { x, y, width, height } => {
                for px in [(unit & 0xFFFF) as u16, (unit >> 16) as u16] {
                    if *y >= *height {
                        return;
                    }
                    out.set(i32::from(*x), i32::from(*y), px);
                    *x += 1;
                    if *x >= *width {
                        *x = 0;
                        *y += 1;
                    }
                }
            }
        }
    }
}
