//! Command fetching from memory into the command buffer.
use zerocopy::FromBytes;

use crate::system::cmd::buffer::CommandBuffer;
use crate::system::mem::{DMEM_LEN, Memory};

/// Mask applied to source offsets in RAM.
pub const RAM_OFFSET_MASK: u32 = 0x00FF_FFF8;
/// Mask applied to source offsets in DMEM.
pub const DMEM_OFFSET_MASK: u32 = (DMEM_LEN as u32 - 1) & !0x7;

/// Where commands are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The shared RAM. Words are copied as they are.
    Ram,
    /// The DMEM scratch region. Offsets wrap around and words are big-endian.
    Dmem,
}

/// Result of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// This many slots were appended to the buffer.
    Fetched(usize),
    /// The requested range is empty.
    Empty,
    /// The buffer doesn't have room for the requested range. Nothing was consumed.
    Full,
    /// The requested range lies outside of RAM. Nothing was consumed.
    OutOfBounds,
}

fn read_ram_word(ram: &[u8], offset: usize) -> Option<u32> {
    u32::read_from_bytes(ram.get(offset..offset + 4)?).ok()
}

fn read_dmem_word(dmem: &[u8; DMEM_LEN], offset: usize) -> u32 {
    u32::from_be_bytes([
        dmem[offset],
        dmem[offset + 1],
        dmem[offset + 2],
        dmem[offset + 3],
    ])
}

/// Copies the slots in `current..end` from `source` into the buffer.
///
/// Both `current` and `end` must already be aligned to 8 bytes. Nothing is committed to the
/// buffer unless the whole range could be copied.
pub fn fetch(
    buffer: &mut CommandBuffer,
    mem: &Memory,
    source: Source,
    current: u32,
    end: u32,
) -> Fetch {
    if end <= current {
        return Fetch::Empty;
    }

    let count = ((end - current) >> 3) as usize;
    if count > buffer.free() {
        tracing::debug!(
            count,
            buffered = buffer.write(),
            "command buffer is full, deferring fetch"
        );
        return Fetch::Full;
    }

    let staging = buffer.staging(count);
    match source {
        Source::Dmem => {
            let dmem = mem.dmem();
            for (index, slot) in staging.chunks_exact_mut(2).enumerate() {
                let offset = (current.wrapping_add(8 * index as u32) & DMEM_OFFSET_MASK) as usize;
                slot[0] = read_dmem_word(dmem, offset);
                slot[1] = read_dmem_word(dmem, offset + 4);
            }
        }
        Source::Ram => {
            let ram = mem.ram();
            for (index, slot) in staging.chunks_exact_mut(2).enumerate() {
                let offset = (current.wrapping_add(8 * index as u32) & RAM_OFFSET_MASK) as usize;
                let (Some(high), Some(low)) = (
                    read_ram_word(ram, offset),
                    read_ram_word(ram, offset + 4),
                ) else {
                    tracing::warn!(
                        current,
                        end,
                        ram_len = ram.len(),
                        "command list lies outside of RAM, dropping it"
                    );
                    return Fetch::OutOfBounds;
                };

                slot[0] = high;
                slot[1] = low;
            }
        }
    }

    buffer.commit(count);
    Fetch::Fetched(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::cmd::buffer::CAPACITY;

    #[test]
    fn dmem_words_are_big_endian() {
        let mut mem = Memory::new(0x1000);
        mem.dmem_mut()[0x10..0x18].copy_from_slice(&[0xE9, 0x00, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78]);

        let mut buffer = CommandBuffer::default();
        let result = fetch(&mut buffer, &mem, Source::Dmem, 0x10, 0x18);

        assert_eq!(result, Fetch::Fetched(1));
        assert_eq!(buffer.command(1), Some(&[0xE900_0000, 0x1234_5678][..]));
    }

    #[test]
    fn dmem_offsets_wrap() {
        let mut mem = Memory::new(0x1000);
        mem.dmem_mut()[0xFF8..].copy_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2]);
        mem.dmem_mut()[..8].copy_from_slice(&[0, 0, 0, 3, 0, 0, 0, 4]);

        let mut buffer = CommandBuffer::default();
        let result = fetch(&mut buffer, &mem, Source::Dmem, 0xFF8, 0x1008);

        assert_eq!(result, Fetch::Fetched(2));
        assert_eq!(buffer.command(2), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn ram_words_are_host_order() {
        let mut mem = Memory::new(0x1000);
        mem.ram_mut()[0x100..0x104].copy_from_slice(&0xFF10_013Fu32.to_ne_bytes());
        mem.ram_mut()[0x104..0x108].copy_from_slice(&0x0010_0000u32.to_ne_bytes());

        let mut buffer = CommandBuffer::default();
        let result = fetch(&mut buffer, &mem, Source::Ram, 0x100, 0x108);

        assert_eq!(result, Fetch::Fetched(1));
        assert_eq!(buffer.command(1), Some(&[0xFF10_013F, 0x0010_0000][..]));
    }

    #[test]
    fn out_of_bounds_commits_nothing() {
        let mem = Memory::new(0x1000);
        let mut buffer = CommandBuffer::default();
        let result = fetch(&mut buffer, &mem, Source::Ram, 0xFF8, 0x1010);

        assert_eq!(result, Fetch::OutOfBounds);
        assert_eq!(buffer.write(), 0);
    }

    #[test]
    fn exactly_full_buffer_fits() {
        let len = 8 * CAPACITY as u32;
        let mem = Memory::new(len as usize + 8);
        let mut buffer = CommandBuffer::default();

        assert_eq!(fetch(&mut buffer, &mem, Source::Ram, 0, len), Fetch::Fetched(CAPACITY));
        assert_eq!(buffer.free(), 0);

        assert_eq!(fetch(&mut buffer, &mem, Source::Ram, len, len + 8), Fetch::Full);
        assert_eq!(buffer.write(), CAPACITY);
    }

    #[test]
    fn one_slot_over_capacity_is_full() {
        let len = 8 * (CAPACITY as u32 + 1);
        let mem = Memory::new(len as usize);
        let mut buffer = CommandBuffer::default();

        assert_eq!(fetch(&mut buffer, &mem, Source::Ram, 0, len), Fetch::Full);
        assert_eq!(buffer.write(), 0);
    }

    #[test]
    fn empty_and_inverted_ranges() {
        let mem = Memory::new(0x1000);
        let mut buffer = CommandBuffer::default();

        assert_eq!(fetch(&mut buffer, &mem, Source::Ram, 0x40, 0x40), Fetch::Empty);
        assert_eq!(fetch(&mut buffer, &mem, Source::Ram, 0x80, 0x40), Fetch::Empty);
    }
}
