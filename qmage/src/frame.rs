//! RGB565 raster buffers.
//!
//! A frame is a linear byte buffer with a `linesize` that may exceed
//! `width * 2`; bytes beyond `width * 2` on each row are padding that must
//! never be read or written by a decoder.

use byteorder::{ByteOrder as _, LittleEndian};

/// A mutable view over one RGB565 raster plus its previous-frame reference.
///
/// Borrows both buffers so the A9LL inter decoder can read from `prev` while
/// writing `cur` without the two ever aliasing the same memory.
pub struct FrameView<'a> {
    pub cur: &'a mut [u8],
    pub width: u16,
    pub height: u16,
    pub linesize: usize,
}

impl<'a> FrameView<'a> {
    pub fn new(cur: &'a mut [u8], width: u16, height: u16, linesize: usize) -> Self {
        debug_assert!(linesize >= usize::from(width) * 2);
        debug_assert!(cur.len() >= linesize * usize::from(height).max(1));
        Self {
            cur,
            width,
            height,
            linesize,
        }
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < u32::from(self.width) && (y as u32) < u32::from(self.height)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.linesize + x as usize * 2
    }

    /// Reads the pixel at `(x, y)`. Out-of-range reads return 0, matching
    /// the A9LL reference-pixel rule.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u16 {
        if !self.in_bounds(x, y) {
            return 0;
        }
        let off = self.offset(x as u32, y as u32);
        LittleEndian::read_u16(&self.cur[off..off + 2])
    }

    /// Writes `pixel` at `(x, y)` if in bounds; out-of-range writes are
    /// silently dropped (callers are expected to have already clipped, this
    /// is a defensive backstop for the edge-block paths).
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, pixel: u16) {
        if !self.in_bounds(x, y) {
            return;
        }
        let off = self.offset(x as u32, y as u32);
        LittleEndian::write_u16(&mut self.cur[off..off + 2], pixel);
    }
}

/// Read-only counterpart of [`FrameView`], used for the retained
/// previous-frame raster.
pub struct PrevFrame<'a> {
    pub data: &'a [u8],
    pub width: u16,
    pub height: u16,
    pub linesize: usize,
}

impl<'a> PrevFrame<'a> {
    pub fn new(data: &'a [u8], width: u16, height: u16, linesize: usize) -> Self {
        Self {
            data,
            width,
            height,
            linesize,
        }
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < u32::from(self.width) && (y as u32) < u32::from(self.height)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u16 {
        if !self.in_bounds(x, y) {
            return 0;
        }
        let off = y as usize * self.linesize + x as usize * 2;
        LittleEndian::read_u16(&self.data[off..off + 2])
    }

    #[inline]
    pub fn contains_block(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        x >= 0 && y >= 0 && x + w <= i32::from(self.width) && y + h <= i32::from(self.height)
    }
}

/// Minimum `linesize` (in bytes) for a tightly packed `width`-wide RGB565 row.
#[inline]
pub const fn tight_linesize(width: u16) -> usize {
    width as usize * 2
}

#[cfg(feature = "alloc")]
pub mod owned {
    //! Heap-backed previous-frame storage for the high-level decoder context.

    use alloc::vec::Vec;

    /// An owned RGB565 raster with tightly-packed rows, used as the
    /// decoder's retained previous-frame slot.
    #[derive(Debug, Clone, Default)]
    pub struct OwnedFrame {
        pub data: Vec<u8>,
        pub width: u16,
        pub height: u16,
    }

    impl OwnedFrame {
        pub fn new(width: u16, height: u16) -> Self {
            let len = super::tight_linesize(width) * usize::from(height);
            Self {
                data: alloc::vec![0u8; len],
                width,
                height,
            }
        }

        pub fn linesize(&self) -> usize {
            super::tight_linesize(self.width)
        }
    }
}
