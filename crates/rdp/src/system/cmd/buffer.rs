//! Local command buffer.
use zerocopy::IntoBytes;

/// Capacity of the command buffer, in 64-bit slots.
pub const CAPACITY: usize = 1 << 17;

/// A fixed capacity buffer of command slots, each made of two 32-bit words.
///
/// Slots in `read..write` are buffered but not yet decoded. Space is only reclaimed once the
/// buffer is fully drained, at which point both cursors return to zero.
#[derive(Clone)]
pub struct CommandBuffer {
    words: Box<[u32]>,
    read: usize,
    write: usize,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self {
            words: vec![0; 2 * CAPACITY].into_boxed_slice(),
            read: 0,
            write: 0,
        }
    }
}

impl CommandBuffer {
    /// Index of the next slot to decode.
    #[inline(always)]
    pub fn read(&self) -> usize {
        self.read
    }

    /// Index of the next slot to fill.
    #[inline(always)]
    pub fn write(&self) -> usize {
        self.write
    }

    /// Amount of slots that can still be filled.
    #[inline(always)]
    pub fn free(&self) -> usize {
        CAPACITY - self.write
    }

    /// Amount of buffered slots which haven't been decoded yet.
    #[inline(always)]
    pub fn pending(&self) -> usize {
        self.write - self.read
    }

    /// All words of the buffer, including stale ones past the write cursor.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Words of the `count` slots starting at the write cursor. Filling them does not make them
    /// visible until [`CommandBuffer::commit`] is called.
    pub fn staging(&mut self, count: usize) -> &mut [u32] {
        &mut self.words[2 * self.write..][..2 * count]
    }

    /// Makes `count` staged slots visible to the decoder.
    pub fn commit(&mut self, count: usize) {
        assert!(count <= self.free());
        self.write += count;
    }

    /// Returns the first word of the slot at the read cursor.
    #[inline(always)]
    pub fn peek(&self) -> Option<u32> {
        (self.read < self.write).then(|| self.words[2 * self.read])
    }

    /// Returns the words of the `slots` slots starting at the read cursor, if all of them are
    /// buffered.
    #[inline(always)]
    pub fn command(&self, slots: usize) -> Option<&[u32]> {
        (self.pending() >= slots).then(|| &self.words[2 * self.read..][..2 * slots])
    }

    /// Consumes `slots` slots. Always advances by at least one slot.
    #[inline(always)]
    pub fn advance(&mut self, slots: usize) {
        self.read = (self.read + slots.max(1)).min(self.write);
    }

    /// Resets both cursors to zero.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Overwrites the whole buffer from its byte representation. Cursors are clamped to the
    /// capacity.
    pub fn restore(&mut self, bytes: &[u8], read: usize, write: usize) {
        self.words.as_mut_bytes().copy_from_slice(bytes);
        self.write = write.min(CAPACITY);
        self.read = read.min(self.write);
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("read", &self.read)
            .field("write", &self.write)
            .finish_non_exhaustive()
    }
}
