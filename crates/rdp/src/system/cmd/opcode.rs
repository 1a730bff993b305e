//! RDP opcodes and their lengths.
use strum::FromRepr;

/// Opcodes below this value never reach the GPU backend.
pub const FIRST_RENDERABLE: u8 = 0x08;

/// Length of each command, in 64-bit slots, indexed by opcode.
#[rustfmt::skip]
pub const LENGTHS: [u8; 64] = [
    // 0x00..0x08: no-ops
    1, 1, 1, 1, 1, 1, 1, 1,
    // 0x08..0x10: triangles, growing with edge, shade, texture and depth coefficients
    4, 6, 12, 14, 12, 14, 20, 22,
    // 0x10..0x24
    1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1,
    // 0x24..0x26: texture rectangles
    2, 2,
    // 0x26..0x40
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1,
];

const _: () = {
    let mut i = 0;
    while i < LENGTHS.len() {
        assert!(LENGTHS[i] >= 1 && LENGTHS[i] <= 22);
        i += 1;
    }
};

/// Length of the command with the given opcode, in 64-bit slots. Always at least one.
#[inline(always)]
pub fn length(opcode: u8) -> usize {
    LENGTHS[(opcode & 0x3F) as usize] as usize
}

/// Whether commands with the given opcode are forwarded to the GPU backend.
#[inline(always)]
pub fn is_renderable(opcode: u8) -> bool {
    opcode >= FIRST_RENDERABLE
}

/// Extracts the opcode of a command from its first word.
#[inline(always)]
pub fn of(word: u32) -> u8 {
    ((word >> 24) & 0x3F) as u8
}

/// An RDP opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Opcode {
    Nop                         = 0x00,
    FillTriangle                = 0x08,
    FillZBufferTriangle         = 0x09,
    TextureTriangle             = 0x0A,
    TextureZBufferTriangle      = 0x0B,
    ShadeTriangle               = 0x0C,
    ShadeZBufferTriangle        = 0x0D,
    ShadeTextureTriangle        = 0x0E,
    ShadeTextureZBufferTriangle = 0x0F,
    TextureRectangle            = 0x24,
    TextureRectangleFlip        = 0x25,
    SyncLoad                    = 0x26,
    SyncPipe                    = 0x27,
    SyncTile                    = 0x28,
    SyncFull                    = 0x29,
    SetKeyGB                    = 0x2A,
    SetKeyR                     = 0x2B,
    SetConvert                  = 0x2C,
    SetScissor                  = 0x2D,
    SetPrimDepth                = 0x2E,
    SetOtherModes               = 0x2F,
    LoadTlut                    = 0x30,
    SetTileSize                 = 0x32,
    LoadBlock                   = 0x33,
    LoadTile                    = 0x34,
    SetTile                     = 0x35,
    FillRectangle               = 0x36,
    SetFillColor                = 0x37,
    SetFogColor                 = 0x38,
    SetBlendColor               = 0x39,
    SetPrimColor                = 0x3A,
    SetEnvColor                 = 0x3B,
    SetCombine                  = 0x3C,
    SetTextureImage             = 0x3D,
    SetMaskImage                = 0x3E,
    SetColorImage               = 0x3F,
}

impl Opcode {
    pub fn length(self) -> usize {
        self::length(self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(Opcode::Nop.length(), 1);
        assert_eq!(Opcode::FillTriangle.length(), 4);
        assert_eq!(Opcode::ShadeTextureZBufferTriangle.length(), 22);
        assert_eq!(Opcode::TextureRectangle.length(), 2);
        assert_eq!(Opcode::TextureRectangleFlip.length(), 2);
        assert_eq!(Opcode::SyncFull.length(), 1);
        assert_eq!(Opcode::SetColorImage.length(), 1);
    }

    #[test]
    fn decode_from_word() {
        assert_eq!(of(0xE900_0000), 0x29);
        assert_eq!(of(0xFF10_013F), 0x3F);
        assert_eq!(Opcode::from_repr(of(0x0800_0000)), Some(Opcode::FillTriangle));
        assert!(is_renderable(Opcode::SetScissor as u8));
        assert!(is_renderable(Opcode::FillTriangle as u8));
        assert!(!is_renderable(0x07));
        assert!(!is_renderable(Opcode::Nop as u8));
    }
}
