//! Alpha sub-bitstream scanner (component C) and packet boundary discovery.
//!
//! The alpha plane itself is never decoded into the RGB565 output (`spec.md`
//! §1 Non-goals, §9 "Alpha not rendered") — this module exists purely so the
//! container splitter described in §6 can find where one animation keyframe
//! packet ends and the next begins.

use crate::bitreader::{BitReader, ByteReader};
use crate::error::{EndOfStreamSnafu, Error, InvalidSnafu, Result, UnsupportedFeatureSnafu};
use crate::header::Header;
use snafu::ensure;

/// Walks the alpha sub-bitstream starting at the current byte position of
/// `data` (i.e. `data[0]` is the first byte of the `len1`/`len2` pair) and
/// returns the number of bytes it occupies, rounded up to a multiple of 4.
///
/// Preconditions (`spec.md` §4.C): `width % 8 == 0` and `height % 4 == 0`.
pub fn scan_alpha_size(data: &[u8], width: u16, height: u16) -> Result<u32> {
    ensure!(
        width % 8 == 0 && height % 4 == 0,
        UnsupportedFeatureSnafu {
            what: "unaligned alpha dimensions"
        }
    );

    let mut head = ByteReader::new(data);
    let len1 = head.read_le32()?;
    let len2 = head.read_le32()?;
    ensure!(
        len1 >= 8 && len1 <= len2,
        InvalidSnafu {
            why: "alpha len1/len2 out of range"
        }
    );

    let body_len = (len2 - 8) as usize;
    ensure!(data.len() >= 8 + body_len, EndOfStreamSnafu);
    let body = &data[8..8 + body_len];

    let gb1_len = (len1 - 8) as usize;
    let gb2_len = body_len - gb1_len;
    let gb1_bytes = &body[..gb1_len];
    let gb2_bytes = &body[gb1_len..gb1_len + gb2_len];

    let mut gb1 = BitReader::new(gb1_bytes);
    let mut gb2 = BitReader::new(gb2_bytes);

    let gb3_start = 8 + body_len;
    ensure!(data.len() >= gb3_start, EndOfStreamSnafu);
    let mut gb3 = ByteReader::new(&data[gb3_start..]);

    let bands = u32::from(height) / 4;
    let cells = u32::from(width) / 8;

    for _ in 0..bands {
        for _ in 0..cells {
            let mode = gb1.read_bits(2)?;
            if mode < 3 {
                let cbp = gb3.read_le16()?;
                for k in 0..16u32 {
                    let bit = (cbp >> k) & 1;
                    if bit == 0 {
                        let nb_bits = gb2.read_bits(3)?;
                        if nb_bits == 7 {
                            gb3.skip(2)?;
                        } else {
                            gb1.skip_bits(usize::from(nb_bits) + 1)?;
                        }
                    }
                }
            }
        }
    }

    let consumed = gb3_start as u32 + gb3.position() as u32;
    Ok((consumed + 3) & !3)
}

/// Result of the §6 "packet boundary discovery" procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketBoundary {
    /// Still images are a single packet spanning the whole remaining stream.
    WholeStream,
    /// Animation frames occupy exactly this many bytes.
    Sized(u32),
}

/// Computes the packet boundary for the frame whose header has already been
/// parsed out of `data`.
pub fn packet_boundary(data: &[u8], header: &Header) -> Result<PacketBoundary> {
    if !header.mode {
        return Ok(PacketBoundary::WholeStream);
    }

    ensure!(
        header.alpha_position >= header.header_size,
        InvalidSnafu {
            why: "alpha_position before header_size"
        }
    );
    let alpha_offset = header.alpha_position as usize;
    ensure!(data.len() >= alpha_offset, EndOfStreamSnafu);

    let alpha_size = if header.current_frame_number == 1 {
        scan_alpha_size(&data[alpha_offset..], header.width, header.height)?
    } else {
        let mut r = ByteReader::new(&data[alpha_offset..]);
        let len = r.read_le32()?;
        ensure!(len >= 4, InvalidSnafu { why: "alpha length < 4" });
        len
    };

    Ok(PacketBoundary::Sized(header.alpha_position + alpha_size))
}
