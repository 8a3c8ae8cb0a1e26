//! Container probe (`spec.md` §6): a cheap plausibility check used by the
//! enclosing multimedia framework to pick a demuxer, distinct from the full
//! header parse in [`crate::header`].

use crate::header::MAGIC;

/// Returned when the probe accepts a buffer as plausibly Qmage. Mirrors the
/// source's `AVPROBE_SCORE_EXTENSION / 4` convention: a real match, but
/// deliberately not the maximum score, since the only evidence examined is
/// the magic plus non-zero dimensions.
pub const PROBE_SCORE_QMAGE: u32 = AVPROBE_SCORE_EXTENSION / 4;

/// Stand-in for the enclosing framework's `AVPROBE_SCORE_EXTENSION`
/// constant (50 in the systems this format is embedded in).
const AVPROBE_SCORE_EXTENSION: u32 = 50;

/// Scores `data` as a candidate Qmage packet. Returns `0` for anything that
/// isn't plausibly Qmage, [`PROBE_SCORE_QMAGE`] otherwise.
pub fn probe(data: &[u8]) -> u32 {
    if data.len() < 10 {
        return 0;
    }

    let magic = (u16::from(data[0]) << 8) | u16::from(data[1]);
    if magic != MAGIC {
        return 0;
    }

    let width = u16::from_le_bytes([data[6], data[7]]);
    let height = u16::from_le_bytes([data[8], data[9]]);
    if width == 0 || height == 0 {
        return 0;
    }

    log::debug!("qmage probe: {width}x{height}, score={PROBE_SCORE_QMAGE}");
    PROBE_SCORE_QMAGE
}
