//! Composition of the rendered frame onto the output.
use serde::{Deserialize, Serialize};

use crate::modules::backend::ScanoutOptions;
use crate::modules::display::{Composition, UvRect, Viewport};
use crate::system::System;

/// Width of the displayed content.
pub const DISPLAY_WIDTH: u32 = 640;
/// Width of the displayed content in widescreen mode.
pub const WIDESCREEN_DISPLAY_WIDTH: u32 = 854;
/// Height of the displayed content.
pub const DISPLAY_HEIGHT: u32 = 480;
/// Fraction of the image height cropped at the top and at the bottom when removing the
/// letterbox of widescreen content. 16:9 content inside a 4:3 frame leaves 1/8 of the height
/// empty on each side.
pub const OVERSCAN_CROP: f32 = 1.0 / 8.0;

/// How the content is scaled to fit the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scaling {
    /// Largest scale that fits while keeping the aspect ratio.
    #[default]
    Aspect,
    /// Largest whole scale that fits, at least one.
    Integer,
}

/// Computes the viewport of `content` inside `output`, centered.
pub fn viewport(scaling: Scaling, output: (u32, u32), content: (u32, u32)) -> Viewport {
    let (output_width, output_height) = (output.0 as f32, output.1 as f32);
    let (content_width, content_height) = (content.0.max(1) as f32, content.1.max(1) as f32);

    let scale = (output_width / content_width).min(output_height / content_height);
    let scale = match scaling {
        Scaling::Aspect => scale,
        Scaling::Integer => scale.floor().max(1.0),
    };

    let width = content_width * scale;
    let height = content_height * scale;

    Viewport {
        x: ((output_width - width) / 2.0).floor(),
        y: ((output_height - height) / 2.0).floor(),
        width,
        height,
    }
}

/// Texture coordinates to sample, removing the letterbox if requested.
pub fn uv_rect(widescreen: bool, crop_overscan: bool) -> UvRect {
    if widescreen && crop_overscan {
        UvRect {
            top_left: [0.0, OVERSCAN_CROP],
            bottom_right: [1.0, 1.0 - OVERSCAN_CROP],
        }
    } else {
        UvRect::FULL
    }
}

/// Presents the latest completed frame and advances the display frame.
pub fn present(sys: &mut System) {
    let options = ScanoutOptions {
        persist_frame: sys.config.persist_frame,
    };

    let composition = sys.modules.backend.scanout(&options).map(|image| {
        let content_width = if sys.config.widescreen {
            WIDESCREEN_DISPLAY_WIDTH
        } else {
            DISPLAY_WIDTH
        };

        Composition {
            image,
            viewport: self::viewport(
                sys.config.scaling,
                sys.modules.display.size(),
                (content_width, DISPLAY_HEIGHT),
            ),
            uv: self::uv_rect(sys.config.widescreen, sys.config.crop_overscan),
        }
    });

    if composition.is_none() {
        tracing::trace!("no frame to scan out yet");
    }

    sys.modules.display.present(composition);
    sys.timeline.advance_frame();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_pillarbox() {
        let vp = viewport(Scaling::Aspect, (1920, 1080), (640, 480));
        assert_eq!(
            vp,
            Viewport {
                x: 240.0,
                y: 0.0,
                width: 1440.0,
                height: 1080.0
            }
        );
    }

    #[test]
    fn aspect_letterbox() {
        let vp = viewport(Scaling::Aspect, (640, 960), (640, 480));
        assert_eq!(
            vp,
            Viewport {
                x: 0.0,
                y: 240.0,
                width: 640.0,
                height: 480.0
            }
        );
    }

    #[test]
    fn integer_scale() {
        let vp = viewport(Scaling::Integer, (1920, 1080), (640, 480));
        assert_eq!(
            vp,
            Viewport {
                x: 320.0,
                y: 60.0,
                width: 1280.0,
                height: 960.0
            }
        );
    }

    #[test]
    fn integer_scale_is_at_least_one() {
        let vp = viewport(Scaling::Integer, (320, 240), (640, 480));
        assert_eq!(vp.width, 640.0);
        assert_eq!(vp.height, 480.0);
        assert_eq!(vp.x, -160.0);
    }

    #[test]
    fn crop_only_for_widescreen() {
        assert_eq!(uv_rect(false, true), UvRect::FULL);
        assert_eq!(uv_rect(true, false), UvRect::FULL);
        assert_eq!(uv_rect(true, true).top_left, [0.0, 0.125]);
        assert_eq!(uv_rect(true, true).bottom_right, [1.0, 0.875]);
    }
}
