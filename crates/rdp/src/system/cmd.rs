//! Command list processing: fetching, decoding and dispatching of RDP commands.
pub mod buffer;
pub mod fetch;
pub mod opcode;

use buffer::CommandBuffer;
use fetch::{Fetch, Source};
use opcode::Opcode;

use crate::system::System;
use crate::system::dpc::ADDRESS_MASK;
use crate::system::fb::{
    self, Framebuffer, LoadBlock, LoadTile, Scissor, SetImage, SetOtherModes, SetScissor,
};

/// Interrupt delay reported by a full sync when the scissor region is empty.
pub const FALLBACK_SYNC_DELAY: u64 = 5000;

/// A decoded command, as far as the processor itself is concerned.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Anything that needs no handling besides (possibly) being forwarded.
    Inert,
    /// A command that draws into the color (and possibly depth) image.
    Draw(Opcode),
    SyncFull,
    SetScissor(SetScissor),
    SetOtherModes(SetOtherModes),
    LoadTile(LoadTile),
    LoadBlock(LoadBlock),
    LoadTlut(LoadTile),
    SetTextureImage(SetImage),
    SetMaskImage(SetImage),
    SetColorImage(SetImage),
}

impl Command {
    /// Decodes a command from its words.
    pub fn decode(words: &[u32]) -> Self {
        let Some(opcode) = Opcode::from_repr(opcode::of(words[0])) else {
            return Self::Inert;
        };

        let slot = fb::slot(words);
        match opcode {
            Opcode::FillTriangle
            | Opcode::FillZBufferTriangle
            | Opcode::TextureTriangle
            | Opcode::TextureZBufferTriangle
            | Opcode::ShadeTriangle
            | Opcode::ShadeZBufferTriangle
            | Opcode::ShadeTextureTriangle
            | Opcode::ShadeTextureZBufferTriangle
            | Opcode::TextureRectangle
            | Opcode::TextureRectangleFlip
            | Opcode::FillRectangle => Self::Draw(opcode),
            Opcode::SyncFull => Self::SyncFull,
            Opcode::SetScissor => Self::SetScissor(SetScissor::from_bits(slot)),
            Opcode::SetOtherModes => Self::SetOtherModes(SetOtherModes::from_bits(slot)),
            Opcode::LoadTile => Self::LoadTile(LoadTile::from_bits(slot)),
            Opcode::LoadBlock => Self::LoadBlock(LoadBlock::from_bits(slot)),
            Opcode::LoadTlut => Self::LoadTlut(LoadTile::from_bits(slot)),
            Opcode::SetTextureImage => Self::SetTextureImage(SetImage::from_bits(slot)),
            Opcode::SetMaskImage => Self::SetMaskImage(SetImage::from_bits(slot)),
            Opcode::SetColorImage => Self::SetColorImage(SetImage::from_bits(slot)),
            _ => Self::Inert,
        }
    }
}

/// Command processing state.
#[derive(Debug, Default)]
pub struct Interface {
    pub buffer: CommandBuffer,
    pub fb: Framebuffer,
    /// Pixels inside the last scissor rectangle.
    pub scissor_pixels: u32,
}

/// Applies a decoded command to the tracked state. Returns the interrupt delay if the command
/// was a full sync.
fn execute(sys: &mut System, command: Command) -> Option<u64> {
    match command {
        Command::Inert => (),
        Command::Draw(opcode) => {
            tracing::trace!("draw {opcode:?}");
            sys.dirty.mark(sys.cmd.fb.color_range());
            if sys.cmd.fb.depth_enabled {
                sys.dirty.mark(sys.cmd.fb.depth_range());
            }
        }
        Command::SyncFull => {
            sys.timeline
                .signal_frame_boundary(sys.modules.backend.as_mut());
            sys.dpc.status.set_pipe_busy(false);
            sys.dpc.status.set_start_gclk(false);

            let delay = match sys.cmd.scissor_pixels {
                0 => FALLBACK_SYNC_DELAY,
                pixels => pixels as u64,
            };

            tracing::debug!(delay, fence = sys.timeline.outstanding().0, "full sync");
            return Some(delay);
        }
        Command::SetScissor(cmd) => {
            let scissor = Scissor::from(cmd);
            sys.cmd.scissor_pixels = scissor.pixels();
            sys.cmd.fb.set_scissor(scissor);
        }
        Command::SetOtherModes(cmd) => sys.cmd.fb.depth_enabled = cmd.z_update(),
        Command::LoadTile(cmd) => sys.dirty.mark(sys.cmd.fb.texture.tile_range(cmd)),
        Command::LoadBlock(cmd) => sys.dirty.mark(sys.cmd.fb.texture.block_range(cmd)),
        Command::LoadTlut(cmd) => sys.dirty.mark(sys.cmd.fb.texture.tlut_range(cmd)),
        Command::SetTextureImage(cmd) => sys.cmd.fb.set_texture_image(cmd),
        Command::SetMaskImage(cmd) => sys.cmd.fb.set_mask_image(cmd),
        Command::SetColorImage(cmd) => {
            sys.cmd.fb.set_color_image(cmd);
            tracing::debug!(
                address = sys.cmd.fb.address,
                width = sys.cmd.fb.width,
                size = ?sys.cmd.fb.size,
                "color image changed"
            );
        }
    }

    None
}

/// Decodes buffered commands until the buffer is drained or the next command is incomplete.
///
/// Returns the interrupt delay of the last full sync processed, or zero if there was none.
fn drain(sys: &mut System) -> u64 {
    let mut delay = 0;
    while let Some(first) = sys.cmd.buffer.peek() {
        let opcode = opcode::of(first);
        let length = opcode::length(opcode);

        let Some(words) = sys.cmd.buffer.command(length) else {
            tracing::trace!(
                opcode,
                length,
                pending = sys.cmd.buffer.pending(),
                "incomplete command, waiting for more data"
            );

            sys.dpc.start = sys.dpc.end;
            sys.dpc.current = sys.dpc.end;
            return delay;
        };

        if opcode::is_renderable(opcode) {
            sys.modules.backend.enqueue_command(words);
            sys.timeline.note_work();
        }

        let command = Command::decode(words);
        if let Some(sync_delay) = self::execute(sys, command) {
            delay = sync_delay;
        }

        sys.cmd.buffer.advance(length);
    }

    sys.cmd.buffer.reset();
    sys.dpc.current = sys.dpc.end;
    sys.dpc.status.set_cbuf_ready(true);

    delay
}

/// Runs a processing cycle: fetches the commands in `current..end` and processes them.
///
/// Returns the delay until the DP interrupt should be raised, zero if none.
pub fn process(sys: &mut System) -> u64 {
    let current = sys.dpc.current & ADDRESS_MASK;
    let end = sys.dpc.end & ADDRESS_MASK;
    let source = if sys.dpc.status.xbus_dmem_dma() {
        Source::Dmem
    } else {
        Source::Ram
    };

    match fetch::fetch(&mut sys.cmd.buffer, &sys.mem, source, current, end) {
        Fetch::Fetched(count) => {
            tracing::trace!(count, ?source, "fetched command slots");
        }
        Fetch::Empty | Fetch::Full | Fetch::OutOfBounds => return 0,
    }

    sys.dpc.status.set_pipe_busy(true);
    sys.dpc.status.set_start_gclk(true);

    self::drain(sys)
}
