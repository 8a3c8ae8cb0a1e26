//! A9LL inter (non-keyframe) decoder — component E.

use crate::bitreader::{BitReader, ByteReader};
use crate::error::{Error, Result};
use crate::frame::{FrameView, PrevFrame};
use crate::header::Header;
use crate::tables;

const MB: i32 = 16;
const SUB: i32 = 4;

/// Decodes an A9LL inter (animation, non-keyframe) raster into `out`, using
/// `prev` as the motion-compensation reference.
pub fn decode(header: &Header, data: &[u8], out: &mut FrameView<'_>, prev: &PrevFrame<'_>) -> Result<()> {
    let size = data.len() as u32;
    let header_size = header.header_size;

    if size < header_size + 8 {
        return Err(Error::Invalid {
            why: "packet too small for A9LL inter header",
        });
    }
    if header.width % 4 != 0 || header.height % 4 != 0 {
        return Err(Error::Invalid {
            why: "dimensions not a multiple of 4",
        });
    }

    let mut cursor = ByteReader::new(&data[header_size as usize..]);
    let gb1_start = cursor.read_le32()?;
    let _gb3_start = cursor.read_le32()?; // shared header shape with intra; unused here

    let lo = header_size + 8;
    if gb1_start < lo || gb1_start > size {
        return Err(Error::Invalid {
            why: "gb1_start out of range",
        });
    }

    let mut gb1 = BitReader::new(&data[lo as usize..gb1_start as usize]);
    let mut gb2 = ByteReader::new(&data[gb1_start as usize..size as usize]);

    let ori_delta = tables::ori_delta_for_version(header.qversion);

    let width = i32::from(header.width);
    let height = i32::from(header.height);

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            if x + MB <= width && y + MB <= height {
                decode_mb_interior(&mut gb1, &mut gb2, out, prev, ori_delta, header.qp, x, y)?;
            } else {
                decode_mb_edge(&mut gb1, &mut gb2, out, ori_delta, header.qp, x, y, width, height)?;
            }
            x += MB;
        }
        y += MB;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn decode_mb_interior(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    out: &mut FrameView<'_>,
    prev: &PrevFrame<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    qp: u8,
    x: i32,
    y: i32,
) -> Result<()> {
    let h1 = gb1.read_bit()?;
    if h1 == 0 {
        for_each_subblock(x, y, |bx, by| {
            decode_block2(gb1, gb2, out, ori_delta, qp, bx, by)
        })?;
        return Ok(());
    }

    let h2 = gb1.read_bit()?;
    if h2 == 1 {
        copy_mb_from_prev(out, prev, x, y, x, y, MB, MB);
        return Ok(());
    }

    let h3 = gb1.read_bit()?;
    let (mv_x, mv_y) = if h3 == 0 {
        let mv_x = i32::from(gb1.read_bits(8)?) - 0x7F;
        let mv_y = i32::from(gb1.read_bits(7)?) - 0x3F;

        if !prev.contains_block(x + mv_x, y + mv_y, MB, MB) {
            return Err(Error::Invalid {
                why: "motion vector out of range",
            });
        }

        let h4 = gb1.read_bit()?;
        if h4 == 1 {
            copy_mb_from_prev(out, prev, x, y, x + mv_x, y + mv_y, MB, MB);
            return Ok(());
        }

        (mv_x, mv_y)
    } else {
        (0, 0)
    };

    for_each_subblock(x, y, |bx, by| {
        decode_block3(gb1, gb2, out, prev, ori_delta, qp, bx, by, mv_x, mv_y)
    })
}

fn for_each_subblock(
    x: i32,
    y: i32,
    mut f: impl FnMut(i32, i32) -> Result<()>,
) -> Result<()> {
    let mut j = 0;
    while j < MB {
        let mut i = 0;
        while i < MB {
            f(x + i, y + j)?;
            i += SUB;
        }
        j += SUB;
    }
    Ok(())
}

fn copy_mb_from_prev(
    out: &mut FrameView<'_>,
    prev: &PrevFrame<'_>,
    dst_x: i32,
    dst_y: i32,
    src_x: i32,
    src_y: i32,
    w: i32,
    h: i32,
) {
    for j in 0..h {
        for i in 0..w {
            let p = prev.get(src_x + i, src_y + j);
            out.set(dst_x + i, dst_y + j, p);
        }
    }
}

fn copy_edge(out: &mut FrameView<'_>, x: i32, y: i32) {
    if x == 0 {
        return;
    }
    let edge = out.get(x - 1, y);
    for j in 0..SUB {
        for i in 0..SUB {
            out.set(x + i, y + j, edge);
        }
    }
}

/// Intra 4x4 cell shared by `decode_block2` and modes 0..=3 of `decode_block3`.
fn intra_cell(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    out: &mut FrameView<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    mode: u16,
    x: i32,
    y: i32,
) -> Result<()> {
    if mode == 3 {
        copy_edge(out, x, y);
        return Ok(());
    }

    let (dx, dy) = tables::QMAGE_DIR[mode as usize];
    for j in 0..SUB {
        for i in 0..SUB {
            let ref_pixel = out.get(x + i + dx, y + j + dy);
            let v = decode_pixel_bits(gb1, gb2, ori_delta, ref_pixel)?;
            out.set(x + i, y + j, v);
        }
    }
    Ok(())
}

fn decode_block2(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    out: &mut FrameView<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    qp: u8,
    x: i32,
    y: i32,
) -> Result<()> {
    let mode = gb1.read_bits(2)?;
    check_qp_skip(gb1, qp)?;
    intra_cell(gb1, gb2, out, ori_delta, mode, x, y)
}

#[allow(clippy::too_many_arguments)]
fn decode_block3(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    out: &mut FrameView<'_>,
    prev: &PrevFrame<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    qp: u8,
    x: i32,
    y: i32,
    mv_x: i32,
    mv_y: i32,
) -> Result<()> {
    let mode = gb1.read_bits(3)?;
    check_qp_skip(gb1, qp)?;

    match mode {
        0..=3 => intra_cell(gb1, gb2, out, ori_delta, mode, x, y),
        4 => {
            for j in 0..SUB {
                for i in 0..SUB {
                    let ref_pixel = prev.get(x + i, y + j);
                    let v = decode_pixel_bits(gb1, gb2, ori_delta, ref_pixel)?;
                    out.set(x + i, y + j, v);
                }
            }
            Ok(())
        }
        5 => {
            copy_mb_from_prev(out, prev, x, y, x, y, SUB, SUB);
            Ok(())
        }
        6 => {
            for j in 0..SUB {
                for i in 0..SUB {
                    let ref_pixel = prev.get(x + i + mv_x, y + j + mv_y);
                    let v = decode_pixel_bits(gb1, gb2, ori_delta, ref_pixel)?;
                    out.set(x + i, y + j, v);
                }
            }
            Ok(())
        }
        7 => {
            if prev.contains_block(x + mv_x, y + mv_y, SUB, SUB) {
                copy_mb_from_prev(out, prev, x, y, x + mv_x, y + mv_y, SUB, SUB);
            } else {
                log::warn!(
                    "qmage: A9LL inter sub-block motion vector out of range at ({x},{y}), mv=({mv_x},{mv_y}); leaving block unchanged"
                );
            }
            Ok(())
        }
        _ => unreachable!("3-bit mode is always 0..=7"),
    }
}

#[inline]
fn check_qp_skip(gb1: &mut BitReader<'_>, qp: u8) -> Result<()> {
    if qp != 0 {
        let skip = gb1.read_bit()?;
        if skip == 0 {
            return Err(Error::UnsupportedFeature {
                what: "qp_skip",
            });
        }
    }
    Ok(())
}

fn decode_pixel_bits(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    ref_pixel: u16,
) -> Result<u16> {
    let skip = gb1.read_bit()?;
    if skip == 1 {
        return Ok(ref_pixel);
    }

    let nb_bits = gb1.read_bits(3)?;
    if nb_bits == 7 {
        return gb2.read_le16();
    }

    let idx = gb1.read_bits(u32::from(nb_bits) + 1)?;
    let delta = ori_delta[tables::ori_delta_index(idx, u32::from(nb_bits))];
    Ok(ref_pixel.wrapping_add(delta as u16))
}

#[allow(clippy::too_many_arguments)]
fn decode_mb_edge(
    gb1: &mut BitReader<'_>,
    gb2: &mut ByteReader<'_>,
    out: &mut FrameView<'_>,
    ori_delta: &[i16; tables::ORI_DELTA_LEN],
    qp: u8,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Result<()> {
    let skip = gb1.read_bit()?;
    if skip == 1 {
        return Err(Error::UnsupportedFeature { what: "edge_skip" });
    }

    let mut j = 0;
    while j < MB && y + j < height {
        let mut i = 0;
        while i < MB && x + i < width {
            let cell_x = x + i;
            let cell_y = y + j;
            let straddles = cell_x + SUB > width || cell_y + SUB > height;

            if straddles {
                for jj in 0..SUB {
                    for ii in 0..SUB {
                        let px = cell_x + ii;
                        let py = cell_y + jj;
                        if px < width && py < height {
                            let literal = gb2.read_le16()?;
                            out.set(px, py, literal);
                        }
                    }
                }
            } else {
                decode_block2(gb1, gb2, out, ori_delta, qp, cell_x, cell_y)?;
            }

            i += SUB;
        }
        j += SUB;
    }

    Ok(())
}
