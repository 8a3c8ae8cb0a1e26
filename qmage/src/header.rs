//! Fixed-layout Qmage header parser (component B of `spec.md` §2).

use crate::bitreader::ByteReader;
use crate::error::{Error, Result};
use snafu::ensure;

/// Magic bytes at offset 0, big-endian: ASCII `"QM"`.
pub const MAGIC: u16 = 0x514D;

/// `raw_type` values the core understands; everything else is rejected in
/// `parse` per `spec.md` §4.B.
const RAW_TYPE_RGB565: u8 = 0;
const RAW_TYPE_RGBA5658: u8 = 3;
const RAW_TYPE_RGBA: u8 = 6;

/// `qversion == 0xB` is called *legacy*; anything greater is *post-legacy*.
const QVERSION_LEGACY: u8 = 0xB;

/// Parsed Qmage container header.
///
/// Field order mirrors `spec.md` §3. Flag-byte bit assignments are not
/// pinned down exhaustively by the spec; the concrete packing used here is
/// recorded as a resolved Open Question in `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub qversion: u8,
    pub raw_type: u8,
    pub transparency: bool,

    pub qp: u8,
    pub not_comp: bool,
    pub use_chroma_key: bool,
    pub mode: bool,

    pub encoder_mode: u8,
    pub is_dynamic_table: bool,
    pub alpha_depth: bool,
    pub depth: u8,
    pub use_extra_exception: bool,

    pub width: u16,
    pub height: u16,

    pub near_lossless: bool,

    pub is_gray_type: bool,
    pub use_index_color: bool,
    pub pre_multiplied: bool,
    pub not_alpha_comp: bool,
    pub is_opaque: bool,
    pub nine_patched: bool,

    /// Meaningful only when `transparency || mode`.
    pub alpha_position: u32,
    /// Post-legacy only.
    pub alpha_encoder_mode: u8,

    pub total_frame_number: u16,
    pub current_frame_number: u16,
    pub animation_delay_time: u16,
    pub animation_no_repeat: u8,

    /// `color_count`, if `use_index_color` was set. Parsed for completeness;
    /// not consumed by any decoder in this core (see `spec.md` §1 Non-goals).
    pub color_count: Option<u32>,

    /// Offset from the start of the packet to the fixed-layout header's end,
    /// per the §3 formula (12 / 16 / 24). Does *not* include `color_count`
    /// bytes — see `DESIGN.md` for why that's safe given `use_index_color`
    /// is always rejected before any decoder dispatch.
    pub header_size: u32,
}

impl Header {
    /// `is_gray_type` and `android_support` name the same bit in the source
    /// format; this accessor documents that alias explicitly (`spec.md` §9).
    #[inline]
    pub fn android_support(&self) -> bool {
        self.is_gray_type
    }
}

/// Parses a Qmage header from the start of `data`.
///
/// `data` must be at least 12 bytes long; shorter input is an
/// [`Error::EndOfStream`], not a panic.
pub fn parse(data: &[u8]) -> Result<Header> {
    ensure!(data.len() >= 12, crate::error::EndOfStreamSnafu);

    let mut r = ByteReader::new(data);

    let magic = (u16::from(r.read_u8()?) << 8) | u16::from(r.read_u8()?);
    ensure!(magic == MAGIC, crate::error::BadMagicSnafu);

    let qversion = r.read_u8()?;
    ensure!(
        qversion == QVERSION_LEGACY || qversion > QVERSION_LEGACY,
        crate::error::UnsupportedVersionSnafu { qversion }
    );
    let legacy = qversion == QVERSION_LEGACY;

    let raw_type = r.read_u8()?;
    ensure!(
        matches!(raw_type, RAW_TYPE_RGB565 | RAW_TYPE_RGBA5658 | RAW_TYPE_RGBA),
        crate::error::UnsupportedFeatureSnafu { what: "raw_type" }
    );
    let transparency = raw_type != RAW_TYPE_RGB565;

    let flag4 = r.read_u8()?;
    let qp = flag4 & 0b0001_1111;
    let not_comp = flag4 & 0b0010_0000 != 0;
    let use_chroma_key = flag4 & 0b0100_0000 != 0;
    let mode = flag4 & 0b1000_0000 != 0;

    let flag5 = r.read_u8()?;
    let (encoder_mode, is_dynamic_table, alpha_depth, depth, use_extra_exception) = if legacy {
        (
            flag5 & 0b0000_0111,
            false,
            flag5 & 0b0000_1000 != 0,
            ((flag5 & 0b0001_0000) >> 4) + 1,
            flag5 & 0b0010_0000 != 0,
        )
    } else {
        (
            flag5 & 0b0000_1111,
            flag5 & 0b0001_0000 != 0,
            flag5 & 0b0010_0000 != 0,
            ((flag5 & 0b0100_0000) >> 6) + 1,
            flag5 & 0b1000_0000 != 0,
        )
    };

    let width = r.read_le16()?;
    let height = r.read_le16()?;
    ensure!(width >= 1 && height >= 1, crate::error::InvalidSnafu { why: "zero dimension" });

    let flag10 = r.read_u8()?;
    let near_lossless = flag10 & 0b1 != 0;

    let flag11 = r.read_u8()?;
    let is_gray_type = flag11 & 0b0000_0001 != 0;
    let use_index_color = flag11 & 0b0000_0010 != 0;
    let pre_multiplied = flag11 & 0b0000_0100 != 0;
    let not_alpha_comp = flag11 & 0b0000_1000 != 0;
    let is_opaque = flag11 & 0b0001_0000 != 0;
    let nine_patched = flag11 & 0b0010_0000 != 0;

    let mut alpha_position: u32 = 0;
    let mut alpha_encoder_mode: u8 = 0;
    if transparency || mode {
        if legacy {
            alpha_position = r.read_le32()?;
        } else {
            alpha_position = u32::from(r.read_le16()?);
            let b = r.read_u8()?;
            alpha_encoder_mode = b & 0b0000_1111;
            let _padding = r.read_u8()?;
        }
    }

    let (total_frame_number, current_frame_number, animation_delay_time, animation_no_repeat) =
        if mode {
            let total_frame_number = r.read_le16()?;
            let current_frame_number = r.read_le16()?;
            let animation_delay_time = r.read_le16()?;
            let animation_no_repeat = r.read_u8()?;
            let _pad = r.read_u8()?;
            (
                total_frame_number,
                current_frame_number,
                animation_delay_time,
                animation_no_repeat,
            )
        } else {
            (0, 0, 0, 0)
        };

    // Post-legacy quarter-offset rule (`spec.md` §4.B): the stored
    // `alpha_position` is a quarter-offset and must be multiplied by 4
    // whenever this isn't a non-keyframe animation frame.
    if !legacy && (transparency || mode) && (!mode || current_frame_number <= 1) {
        alpha_position = alpha_position.saturating_mul(4);
    }

    let color_count = if use_index_color {
        let count = r.read_le32()?;
        if nine_patched {
            r.skip(4)?;
        }
        Some(count)
    } else {
        None
    };

    let header_size: u32 = if mode {
        24
    } else if transparency {
        16
    } else {
        12
    };

    let header = Header {
        qversion,
        raw_type,
        transparency,
        qp,
        not_comp,
        use_chroma_key,
        mode,
        encoder_mode,
        is_dynamic_table,
        alpha_depth,
        depth,
        use_extra_exception,
        width,
        height,
        near_lossless,
        is_gray_type,
        use_index_color,
        pre_multiplied,
        not_alpha_comp,
        is_opaque,
        nine_patched,
        alpha_position,
        alpha_encoder_mode,
        total_frame_number,
        current_frame_number,
        animation_delay_time,
        animation_no_repeat,
        color_count,
        header_size,
    };

    log::debug!(
        "parsed qmage header: {}x{} qversion={:#x} mode={} encoder_mode={} depth={}",
        header.width,
        header.height,
        header.qversion,
        header.mode,
        header.encoder_mode,
        header.depth
    );

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_header() {
        let data = [0x51, 0x4D, 0x0B, 0x00, 0x00, 0x00, 0x04, 0x00];
        assert!(matches!(parse(&data), Err(Error::EndOfStream)));
    }

    #[test]
    fn rejects_bad_magic() {
        let data = [0u8; 12];
        assert!(matches!(parse(&data), Err(Error::BadMagic)));
    }

    #[test]
    fn rejects_unsupported_raw_type() {
        let mut data = minimal_still_header(0x0B, 1, 4, 4);
        data[3] = 9;
        assert!(matches!(
            parse(&data),
            Err(Error::UnsupportedFeature { what: "raw_type" })
        ));
    }

    #[test]
    fn parses_minimal_rgb565_still() {
        let data = minimal_still_header(0x0B, 1, 4, 4);
        let header = parse(&data).unwrap();
        assert_eq!(header.width, 4);
        assert_eq!(header.height, 4);
        assert_eq!(header.raw_type, 0);
        assert!(!header.transparency);
        assert!(!header.mode);
        assert_eq!(header.header_size, 12);
        assert_eq!(header.encoder_mode, 1);
    }

    /// Builds a 12-byte still header (`raw_type`, `mode=0`) with the given
    /// `encoder_mode` in flag byte 5's low bits.
    fn minimal_still_header(qversion: u8, encoder_mode: u8, width: u16, height: u16) -> [u8; 12] {
        let [w0, w1] = width.to_le_bytes();
        let [h0, h1] = height.to_le_bytes();
        [
            0x51,
            0x4D,
            qversion,
            0,
            0,
            encoder_mode,
            w0,
            w1,
            h0,
            h1,
            0,
            0,
        ]
    }
}
