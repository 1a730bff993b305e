//! Save states of the command processor.
//!
//! A snapshot is a fixed size blob containing the raw command buffer followed by a small header
//! with the cursors, the DPC registers and the framebuffer descriptor. GPU side state is never part of it: the
//! backend is expected to be recreated (or kept) by the caller.
use easyerr::Error;
use static_assertions::const_assert_eq;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::system::System;
use crate::system::dpc::Status;
use crate::system::cmd::buffer::CAPACITY;
use crate::system::fb::{Framebuffer, PixelSize, TextureImage};

/// Size of the command buffer words in a snapshot.
const WORDS_SIZE: usize = 2 * CAPACITY * size_of::<u32>();

/// Total size of a snapshot.
pub const SIZE: usize = WORDS_SIZE + size_of::<Header>();

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot buffer is too small: expected {expected} bytes, found {found}")]
    BufferTooSmall { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct Header {
    read: u32,
    write: u32,
    scissor_pixels: u32,
    address: u32,
    size: u32,
    width: u32,
    height: u32,
    y_offset: u32,
    depth_address: u32,
    depth_enabled: u32,
    texture_address: u32,
    texture_size: u32,
    texture_width: u32,
    dpc_start: u32,
    dpc_end: u32,
    dpc_current: u32,
    dpc_status: u32,
}

const_assert_eq!(size_of::<Header>(), 17 * 4);

fn pixel_size(raw: u32) -> PixelSize {
    match raw & 0b11 {
        0 => PixelSize::Bits4,
        1 => PixelSize::Bits8,
        2 => PixelSize::Bits16,
        _ => PixelSize::Bits32,
    }
}

impl Header {
    fn capture(sys: &System) -> Self {
        let fb = &sys.cmd.fb;
        Self {
            read: sys.cmd.buffer.read() as u32,
            write: sys.cmd.buffer.write() as u32,
            scissor_pixels: sys.cmd.scissor_pixels,
            address: fb.address,
            size: fb.size as u32,
            width: fb.width,
            height: fb.height,
            y_offset: fb.y_offset,
            depth_address: fb.depth_address,
            depth_enabled: fb.depth_enabled as u32,
            texture_address: fb.texture.address,
            texture_size: fb.texture.size as u32,
            texture_width: fb.texture.width,
            dpc_start: sys.dpc.start,
            dpc_end: sys.dpc.end,
            dpc_current: sys.dpc.current,
            dpc_status: sys.dpc.status.to_bits(),
        }
    }

    fn framebuffer(&self) -> Framebuffer {
        Framebuffer {
            address: self.address,
            size: pixel_size(self.size),
            width: self.width,
            height: self.height,
            y_offset: self.y_offset,
            depth_address: self.depth_address,
            depth_enabled: self.depth_enabled != 0,
            texture: TextureImage {
                address: self.texture_address,
                size: pixel_size(self.texture_size),
                width: self.texture_width,
            },
        }
    }
}

fn check_len(len: usize) -> Result<(), SnapshotError> {
    if len < SIZE {
        return Err(SnapshotError::BufferTooSmall {
            expected: SIZE,
            found: len,
        });
    }

    Ok(())
}

/// Writes a snapshot into the first [`SIZE`] bytes of `out`, after waiting for the GPU to become
/// idle.
pub fn save(sys: &mut System, out: &mut [u8]) -> Result<(), SnapshotError> {
    check_len(out.len())?;
    sys.timeline
        .wait_idle(sys.modules.backend.as_mut(), &mut sys.dirty);

    let (words, header) = out[..SIZE].split_at_mut(WORDS_SIZE);
    words.copy_from_slice(sys.cmd.buffer.words().as_bytes());
    header.copy_from_slice(Header::capture(sys).as_bytes());

    tracing::debug!(
        read = sys.cmd.buffer.read(),
        write = sys.cmd.buffer.write(),
        "saved snapshot"
    );

    Ok(())
}

/// Restores a snapshot from the first [`SIZE`] bytes of `data`. Bytes past that are ignored.
///
/// Outstanding GPU work tracked by the previous state is forgotten, since the fences it refers
/// to belong to the backend as it was before the load.
pub fn load(sys: &mut System, data: &[u8]) -> Result<(), SnapshotError> {
    let too_small = || SnapshotError::BufferTooSmall {
        expected: SIZE,
        found: data.len(),
    };

    let (words, rest) = data.split_at_checked(WORDS_SIZE).ok_or_else(too_small)?;
    let (header, _) = Header::read_from_prefix(rest).map_err(|_| too_small())?;

    sys.cmd
        .buffer
        .restore(words, header.read as usize, header.write as usize);
    sys.cmd.scissor_pixels = header.scissor_pixels;
    sys.cmd.fb = header.framebuffer();

    sys.dpc.start = header.dpc_start;
    sys.dpc.end = header.dpc_end;
    sys.dpc.current = header.dpc_current;
    sys.dpc.status = Status::from_bits(header.dpc_status);

    sys.timeline = Default::default();
    sys.dirty.clear();

    tracing::debug!(
        read = sys.cmd.buffer.read(),
        write = sys.cmd.buffer.write(),
        "loaded snapshot"
    );

    Ok(())
}
