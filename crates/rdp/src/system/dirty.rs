//! Tracking of RAM regions with pending GPU writes.
use bitvec::vec::BitVec;

use crate::system::fb::Range;

/// Size of a tracked block, as a shift.
pub const BLOCK_SHIFT: u32 = 3;

/// One bit per 8 byte block of RAM, set while the GPU might still write to the block.
#[derive(Debug, Clone)]
pub struct DirtyBitmap {
    bits: BitVec<u64>,
}

impl DirtyBitmap {
    pub fn new(ram_len: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, ram_len >> BLOCK_SHIFT),
        }
    }

    /// Returns the blocks overlapping `range`, clamped to the tracked region.
    fn blocks(&self, range: Range) -> Option<std::ops::RangeInclusive<usize>> {
        if range.len == 0 {
            return None;
        }

        let first = range.start >> BLOCK_SHIFT;
        let last = (range.start + range.len - 1) >> BLOCK_SHIFT;
        if first >= self.bits.len() as u64 {
            return None;
        }

        let last = last.min(self.bits.len() as u64 - 1);
        Some(first as usize..=last as usize)
    }

    /// Marks every block overlapping `range` as dirty, unless its first block already is.
    ///
    /// Ranges are expected to be mostly contiguous, so a dirty first block is taken as the whole
    /// range having been marked during the current epoch.
    pub fn mark(&mut self, range: Range) {
        let Some(blocks) = self.blocks(range) else {
            return;
        };

        if self.bits[*blocks.start()] {
            return;
        }

        tracing::trace!(
            start = range.start,
            len = range.len,
            "marking region as dirty"
        );

        self.bits[blocks].fill(true);
    }

    /// Whether any block overlapping `range` is dirty.
    pub fn is_dirty(&self, range: Range) -> bool {
        self.blocks(range)
            .is_some_and(|blocks| self.bits[blocks].any())
    }

    /// Whether any block at all is dirty.
    pub fn any(&self) -> bool {
        self.bits.any()
    }

    /// Starts a new epoch: every block becomes clean.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u64, len: u64) -> Range {
        Range { start, len }
    }

    #[test]
    fn mark_is_idempotent() {
        let mut once = DirtyBitmap::new(0x1000);
        once.mark(range(0x100, 0x40));

        let mut twice = once.clone();
        twice.mark(range(0x100, 0x40));

        assert_eq!(once.bits, twice.bits);
        assert_eq!(once.bits.count_ones(), 8);
    }

    #[test]
    fn partial_blocks_are_covered() {
        let mut bitmap = DirtyBitmap::new(0x1000);
        bitmap.mark(range(0x0F, 2));

        assert!(bitmap.is_dirty(range(0x08, 1)));
        assert!(bitmap.is_dirty(range(0x10, 1)));
        assert!(!bitmap.is_dirty(range(0x18, 8)));
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut bitmap = DirtyBitmap::new(0x1000);
        bitmap.mark(range(0x2000, 0x100));
        assert!(!bitmap.any());

        bitmap.mark(range(0xFF0, 0x100));
        assert!(bitmap.is_dirty(range(0xFF8, 8)));
        assert!(!bitmap.is_dirty(range(0x1000, 8)));
    }

    #[test]
    fn first_block_short_circuits() {
        let mut bitmap = DirtyBitmap::new(0x1000);
        bitmap.mark(range(0x100, 8));
        bitmap.mark(range(0x100, 0x100));

        assert!(!bitmap.is_dirty(range(0x108, 8)));
    }

    #[test]
    fn empty_range_is_never_dirty() {
        let mut bitmap = DirtyBitmap::new(0x1000);
        bitmap.mark(range(0, 0x1000));
        assert!(!bitmap.is_dirty(range(0x10, 0)));

        bitmap.clear();
        assert!(!bitmap.any());
    }
}
