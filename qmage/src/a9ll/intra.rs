//! A9LL intra (keyframe) decoder — component D.

use crate::bitreader::{BitReader, ByteReader};
use crate::error::{Error, Result};
use crate::frame::FrameView;
use crate::header::Header;
use crate::tables;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

enum OriDelta {
    Static(&'static [i16; tables::ORI_DELTA_LEN]),
    #[cfg(feature = "alloc")]
    Dynamic(Vec<i16>),
}

impl OriDelta {
    #[inline]
    fn get(&self, idx: u16, nb_bits: u32) -> i16 {
        let i = tables::ori_delta_index(idx, nb_bits);
        match self {
            OriDelta::Static(t) => t[i],
            #[cfg(feature = "alloc")]
            OriDelta::Dynamic(v) => v[i],
        }
    }
}

/// Decodes an A9LL keyframe raster into `out`.
///
/// `data` is the full packet (starting at byte 0, i.e. including the
/// header); `out` must already be zero-initialized so mode==3 cells at
/// `x == 0` are left untouched as the spec requires.
pub fn decode(header: &Header, data: &[u8], out: &mut FrameView<'_>) -> Result<()> {
    let size = data.len() as u32;
    let header_size = header.header_size;

    ensure_size(size >= header_size + 8)?;
    ensure_size(header.width % 4 == 0 && header.height % 4 == 0)?;
    if header.use_extra_exception {
        return Err(Error::UnsupportedFeature {
            what: "use_extra_exception",
        });
    }

    let mut cursor = ByteReader::new(&data[header_size as usize..]);
    let gb1_start = cursor.read_le32()?;
    let gb3_start = cursor.read_le32()?;

    let lo = header_size + 8;
    ensure_in_range(gb1_start, lo, size)?;
    ensure_in_range(gb3_start, lo, size)?;

    let gb1_bytes = &data[lo as usize..gb1_start as usize];
    let gb2_bytes = &data[gb1_start as usize..size as usize];
    let mut gb3 = ByteReader::new(&data[gb3_start as usize..size as usize]);

    let mut gb1 = BitReader::new(gb1_bytes);
    let mut gb2 = BitReader::new(gb2_bytes);

    let ori_delta = if header.is_dynamic_table {
        #[cfg(feature = "alloc")]
        {
            OriDelta::Dynamic(tables::reconstruct_dynamic_ori_delta(&mut gb3)?)
        }
        #[cfg(not(feature = "alloc"))]
        {
            return Err(Error::UnsupportedFeature {
                what: "dynamic_ori_delta_table",
            });
        }
    } else {
        OriDelta::Static(tables::ori_delta_for_version(header.qversion))
    };

    let cols = u32::from(header.width) / 4;
    let rows = u32::from(header.height) / 4;

    for cy in 0..rows {
        for cx in 0..cols {
            let x = (cx * 4) as i32;
            let y = (cy * 4) as i32;

            let mode = gb1.read_bits(2)?;

            if mode == 3 {
                if x > 0 {
                    let edge = out.get(x - 1, y);
                    for j in 0..4 {
                        for i in 0..4 {
                            out.set(x + i, y + j, edge);
                        }
                    }
                }
                continue;
            }

            let (dx, dy) = tables::QMAGE_DIR[mode as usize];
            let cbp = gb3.read_le16()?;

            for k in 0..16u32 {
                let j = (k / 4) as i32;
                let i = (k % 4) as i32;
                let px = x + i;
                let py = y + j;

                let ref_pixel = out.get(px + dx, py + dy);
                let bit = (cbp >> k) & 1;

                if bit != 0 {
                    out.set(px, py, ref_pixel);
                    continue;
                }

                let nb_bits = gb2.read_bits(3)?;
                let value = if nb_bits == 7 {
                    gb3.read_le16()?
                } else {
                    let idx = gb1.read_bits(u32::from(nb_bits) + 1)?;
                    let delta = ori_delta.get(idx, u32::from(nb_bits));
                    ref_pixel.wrapping_add(delta as u16)
                };
                out.set(px, py, value);
            }
        }
    }

    Ok(())
}

#[inline]
fn ensure_size(ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::Invalid {
            why: "packet too small for A9LL intra header",
        })
    }
}

#[inline]
fn ensure_in_range(value: u32, lo: u32, hi: u32) -> Result<()> {
    if value >= lo && value <= hi {
        Ok(())
    } else {
        Err(Error::Invalid {
            why: "stream offset out of range",
        })
    }
}
