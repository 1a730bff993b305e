//! Framebuffer and texture image state tracked from metadata commands.
use bitos::bitos;
use bitos::integer::{u3, u10, u12, u24};

/// Mask applied to image addresses.
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Size of a pixel (or texel).
#[bitos(2)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelSize {
    Bits4  = 0,
    Bits8  = 1,
    #[default]
    Bits16 = 2,
    Bits32 = 3,
}

impl PixelSize {
    /// Amount of bytes used by `count` pixels.
    #[inline(always)]
    pub fn bytes(self, count: u64) -> u64 {
        match self {
            Self::Bits4 => count / 2,
            Self::Bits8 => count,
            Self::Bits16 => count * 2,
            Self::Bits32 => count * 4,
        }
    }
}

/// Layout of the Set Color Image and Set Texture Image commands.
#[bitos(64)]
#[derive(Debug, Clone, Copy)]
pub struct SetImage {
    #[bits(0..24)]
    pub address: u24,
    #[bits(32..42)]
    pub width_minus_one: u10,
    #[bits(51..53)]
    pub size: PixelSize,
    #[bits(53..56)]
    pub format: u3,
}

impl SetImage {
    pub fn width(&self) -> u32 {
        self.width_minus_one().value() as u32 + 1
    }
}

/// Layout of the Set Scissor command. Coordinates are in 10.2 fixed point.
#[bitos(64)]
#[derive(Debug, Clone, Copy)]
pub struct SetScissor {
    #[bits(0..12)]
    pub lower_right_y: u12,
    #[bits(12..24)]
    pub lower_right_x: u12,
    #[bits(24)]
    pub odd_line: bool,
    #[bits(25)]
    pub field: bool,
    #[bits(32..44)]
    pub upper_left_y: u12,
    #[bits(44..56)]
    pub upper_left_x: u12,
}

/// A scissor rectangle, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scissor {
    pub upper_left_x: u32,
    pub upper_left_y: u32,
    pub lower_right_x: u32,
    pub lower_right_y: u32,
}

impl From<SetScissor> for Scissor {
    fn from(value: SetScissor) -> Self {
        Self {
            upper_left_x: (value.upper_left_x().value() as u32) >> 2,
            upper_left_y: (value.upper_left_y().value() as u32) >> 2,
            lower_right_x: (value.lower_right_x().value() as u32) >> 2,
            lower_right_y: (value.lower_right_y().value() as u32) >> 2,
        }
    }
}

impl Scissor {
    /// Amount of pixels inside the rectangle. Inverted or empty rectangles have no pixels.
    pub fn pixels(&self) -> u32 {
        if self.lower_right_x <= self.upper_left_x || self.lower_right_y <= self.upper_left_y {
            return 0;
        }

        (self.lower_right_x - self.upper_left_x) * (self.lower_right_y - self.upper_left_y)
    }

    /// Amount of lines covered by the rectangle.
    pub fn height(&self) -> u32 {
        self.lower_right_y.saturating_sub(self.upper_left_y)
    }
}

/// Layout of the Set Other Modes command. Only the fields the tracker cares about are exposed.
#[bitos(64)]
#[derive(Debug, Clone, Copy)]
pub struct SetOtherModes {
    #[bits(4)]
    pub z_compare: bool,
    #[bits(5)]
    pub z_update: bool,
}

/// Layout of the Load Tile and Load Tlut commands. Coordinates are in 10.2 fixed point.
#[bitos(64)]
#[derive(Debug, Clone, Copy)]
pub struct LoadTile {
    #[bits(0..12)]
    pub t_high: u12,
    #[bits(12..24)]
    pub s_high: u12,
    #[bits(24..27)]
    pub tile: u3,
    #[bits(32..44)]
    pub t_low: u12,
    #[bits(44..56)]
    pub s_low: u12,
}

/// Layout of the Load Block command. S coordinates are texel indices.
#[bitos(64)]
#[derive(Debug, Clone, Copy)]
pub struct LoadBlock {
    #[bits(0..12)]
    pub dxt: u12,
    #[bits(12..24)]
    pub s_high: u12,
    #[bits(24..27)]
    pub tile: u3,
    #[bits(32..44)]
    pub t_low: u12,
    #[bits(44..56)]
    pub s_low: u12,
}

/// Joins the two words of a slot into the layout used by the command structs.
#[inline(always)]
pub fn slot(words: &[u32]) -> u64 {
    ((words[0] as u64) << 32) | words[1] as u64
}

/// A byte range in RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: u64,
    pub len: u64,
}

/// The texture image source used by load commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureImage {
    pub address: u32,
    pub size: PixelSize,
    pub width: u32,
}

impl TextureImage {
    /// Range read by a Load Tile command.
    pub fn tile_range(&self, cmd: LoadTile) -> Range {
        let t_low = (cmd.t_low().value() as u64) >> 2;
        let t_high = (cmd.t_high().value() as u64) >> 2;
        let s_low = (cmd.s_low().value() as u64) >> 2;
        let rows = (t_high + 1).saturating_sub(t_low);
        let width = self.width as u64;

        Range {
            start: self.address as u64 + self.size.bytes(t_low * width + s_low),
            len: self.size.bytes(rows * width),
        }
    }

    /// Range read by a Load Block command.
    pub fn block_range(&self, cmd: LoadBlock) -> Range {
        let s_low = cmd.s_low().value() as u64;
        let s_high = cmd.s_high().value() as u64;
        let t_low = cmd.t_low().value() as u64;
        let texels = (s_high + 1).saturating_sub(s_low);

        Range {
            start: self.address as u64 + self.size.bytes(t_low * self.width as u64 + s_low),
            len: self.size.bytes(texels),
        }
    }

    /// Range read by a Load Tlut command. Palette entries are always 16 bits wide.
    pub fn tlut_range(&self, cmd: LoadTile) -> Range {
        let s_low = (cmd.s_low().value() as u64) >> 2;
        let s_high = (cmd.s_high().value() as u64) >> 2;
        let entries = (s_high + 1).saturating_sub(s_low);

        Range {
            start: self.address as u64 + PixelSize::Bits16.bytes(s_low),
            len: PixelSize::Bits16.bytes(entries),
        }
    }
}

/// Framebuffer descriptor: where drawing commands write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Framebuffer {
    pub address: u32,
    pub size: PixelSize,
    pub width: u32,
    /// Height of the scissored region.
    pub height: u32,
    /// First line of the scissored region.
    pub y_offset: u32,
    pub depth_address: u32,
    pub depth_enabled: bool,
    pub texture: TextureImage,
}

impl Framebuffer {
    /// Range of the color image written by drawing commands.
    pub fn color_range(&self) -> Range {
        let width = self.width as u64;
        Range {
            start: self.address as u64 + self.size.bytes(self.y_offset as u64 * width),
            len: self.size.bytes(self.height as u64 * width),
        }
    }

    /// Range of the depth image written by drawing commands. Depth is always 16 bits wide.
    pub fn depth_range(&self) -> Range {
        let width = self.width as u64;
        Range {
            start: self.depth_address as u64
                + PixelSize::Bits16.bytes(self.y_offset as u64 * width),
            len: PixelSize::Bits16.bytes(self.height as u64 * width),
        }
    }

    /// Updates the color image from a Set Color Image command.
    pub fn set_color_image(&mut self, cmd: SetImage) {
        self.address = cmd.address().value() & ADDRESS_MASK;
        self.size = cmd.size();
        self.width = cmd.width();
    }

    /// Updates the depth image from a Set Mask Image command.
    pub fn set_mask_image(&mut self, cmd: SetImage) {
        self.depth_address = cmd.address().value() & ADDRESS_MASK;
    }

    /// Updates the texture image from a Set Texture Image command.
    pub fn set_texture_image(&mut self, cmd: SetImage) {
        self.texture = TextureImage {
            address: cmd.address().value() & ADDRESS_MASK,
            size: cmd.size(),
            width: cmd.width(),
        };
    }

    /// Updates the scissored region.
    pub fn set_scissor(&mut self, scissor: Scissor) {
        self.height = scissor.height();
        self.y_offset = scissor.upper_left_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scissor(ulx: u32, uly: u32, lrx: u32, lry: u32) -> Scissor {
        let w0 = (0x2D << 24) | ((ulx << 2) << 12) | (uly << 2);
        let w1 = ((lrx << 2) << 12) | (lry << 2);
        Scissor::from(SetScissor::from_bits(slot(&[w0, w1])))
    }

    #[test]
    fn scissor_pixels() {
        assert_eq!(scissor(0, 0, 320, 240).pixels(), 76800);
        assert_eq!(scissor(10, 20, 30, 40).pixels(), 400);
        assert_eq!(scissor(320, 240, 0, 0).pixels(), 0);
        assert_eq!(scissor(5, 5, 5, 100).pixels(), 0);
    }

    #[test]
    fn pixel_sizes() {
        assert_eq!(PixelSize::Bits4.bytes(100), 50);
        assert_eq!(PixelSize::Bits8.bytes(100), 100);
        assert_eq!(PixelSize::Bits16.bytes(100), 200);
        assert_eq!(PixelSize::Bits32.bytes(100), 400);
    }

    #[test]
    fn set_color_image() {
        // 16 bit RGBA, 320 pixels wide, at 0x100000
        let cmd = SetImage::from_bits(slot(&[0xFF10_013F, 0x0010_0000]));
        let mut fb = Framebuffer::default();
        fb.set_color_image(cmd);

        assert_eq!(fb.address, 0x0010_0000);
        assert_eq!(fb.size, PixelSize::Bits16);
        assert_eq!(fb.width, 320);
    }

    #[test]
    fn color_range_follows_scissor() {
        let mut fb = Framebuffer {
            address: 0x1000,
            size: PixelSize::Bits32,
            width: 100,
            ..Default::default()
        };

        fb.set_scissor(scissor(0, 10, 100, 30));
        assert_eq!(
            fb.color_range(),
            Range {
                start: 0x1000 + 10 * 100 * 4,
                len: 20 * 100 * 4
            }
        );
    }
}
