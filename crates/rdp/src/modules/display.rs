//! Display module interface.

use crate::modules::backend::ScanoutImage;

/// A rectangle in output (window) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A rectangle in normalized texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub top_left: [f32; 2],
    pub bottom_right: [f32; 2],
}

impl UvRect {
    pub const FULL: Self = Self {
        top_left: [0.0, 0.0],
        bottom_right: [1.0, 1.0],
    };
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Everything needed to draw a scanout image onto the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    pub image: ScanoutImage,
    pub viewport: Viewport,
    pub uv: UvRect,
}

pub trait DisplayModule: Send {
    /// Current size of the output surface, in pixels.
    fn size(&self) -> (u32, u32);

    /// Presents a frame. `None` means the output should simply be cleared.
    fn present(&mut self, composition: Option<Composition>);
}

/// An implementation of [`DisplayModule`] that does nothing.
#[derive(Debug, Clone, Copy)]
pub struct NopDisplayModule;

impl DisplayModule for NopDisplayModule {
    fn size(&self) -> (u32, u32) {
        (640, 480)
    }

    fn present(&mut self, _: Option<Composition>) {}
}
