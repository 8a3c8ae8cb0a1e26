//! Quram Qmage decoder.
//!
//! Converts a Qmage byte payload (used for animated and still assets on
//! Samsung devices) into 16-bit-per-pixel RGB565 raster frames.
//!
//! # Format
//!
//! ## Header (12, 16 or 24 bytes)
//!
//! ```plain
//! Offset  Size  Field
//!      0  2 BE  magic 0x514D ("QM")
//!      2  1     qversion (0xB = legacy, >0xB = post-legacy)
//!      3  1     raw_type (0 = RGB565, 3 = RGBA5658, 6 = RGBA)
//!      4  1     qp:5 | not_comp:1 | use_chroma_key:1 | mode:1
//!      5  1     legacy:       encoder_mode:3 | alpha_depth:1 | depth-1:1 | use_extra_exception:1
//!               post-legacy:  encoder_mode:4 | is_dynamic_table:1 | alpha_depth:1 | depth-1:1 | use_extra_exception:1
//!      6  2 LE  width
//!      8  2 LE  height
//!     10  1     near_lossless:1
//!     11  1     is_gray_type:1 | use_index_color:1 | pre_multiplied:1 | not_alpha_comp:1 | is_opaque:1 | nine_patched:1
//!     12  *     alpha_position (present iff transparency || mode; u32 legacy, u16+u8+u8 post-legacy)
//!      *  8     total/current frame number, delay, no-repeat (present iff mode)
//! ```
//!
//! `header_size` is 24 with `mode`, 16 with `transparency` (no `mode`), else
//! 12.
//!
//! ## A9LL (animation) payload
//!
//! Intra (keyframe, `current_frame_number == 1`) reconstructs a 4x4-block
//! raster from three interleaved cursors (`gb1`/`gb2` bit streams, `gb3` byte
//! stream) reading a 2-bit prediction mode, an optional 16-bit coded block
//! pattern, and per-pixel `ori_delta`-indexed deltas or raw literals.
//!
//! Inter (`current_frame_number > 1`) walks 16x16 macroblocks against the
//! previous frame, falling through verbatim-copy, motion-compensated, and
//! 4x4 intra/residual paths as each macroblock's header bits dictate.
//!
//! ## W2_PASS (still) payload
//!
//! `depth=1` is a run/dictionary decoder over 32-bit little-endian units.
//! `depth=2` runs a 16-byte-strip predictor into an intermediate buffer and
//! hands that buffer to `depth=1`.
//!
//! Alpha data is parsed only far enough to locate packet boundaries; no
//! alpha plane is ever produced in the decoded output.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod a9ll;
pub mod alpha;
pub mod bitreader;
pub mod error;
pub mod frame;
pub mod header;
pub mod probe;
pub mod tables;
pub mod w2pass;

#[cfg(feature = "alloc")]
pub mod driver;

pub use error::{Error, Result};
pub use frame::{FrameView, PrevFrame};
pub use header::Header;

#[cfg(feature = "alloc")]
pub use driver::{DecodedFrameInfo, Decoder};
