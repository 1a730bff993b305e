mod blit;

use std::sync::{Arc, Mutex};

use rdp::modules::backend::ImageId;
use rdp::modules::display::{Composition, DisplayModule};
use rustc_hash::FxHashMap;

use crate::blit::ScanoutBlitter;

/// An image the scanout composition can refer to.
struct Image {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct State {
    size: (u32, u32),
    composition: Option<Composition>,
}

struct Inner {
    device: wgpu::Device,
    queue: wgpu::Queue,
    blitter: ScanoutBlitter,
    images: Mutex<FxHashMap<ImageId, Image>>,
    state: Mutex<State>,
}

/// A WGPU based display implementation.
///
/// Backends hand their scanout images to it, either as textures they already own or as pixels to
/// upload, and the latest composition presented by the processor is drawn on [`Renderer::render`].
///
/// This type is reference counted and therefore cheaply clonable.
#[derive(Clone)]
pub struct Renderer {
    inner: Arc<Inner>,
}

impl Renderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let blitter = ScanoutBlitter::new(&device, format);
        Self {
            inner: Arc::new(Inner {
                device,
                queue,
                blitter,
                images: Mutex::new(FxHashMap::default()),
                state: Mutex::new(State {
                    size: (1, 1),
                    composition: None,
                }),
            }),
        }
    }

    /// Registers a texture as the image `id`, replacing any previous one.
    pub fn insert_image(&self, id: ImageId, texture: wgpu::Texture) {
        let view = texture.create_view(&Default::default());
        self.inner
            .images
            .lock()
            .unwrap()
            .insert(id, Image { texture, view });
    }

    /// Uploads RGBA8 pixels as the image `id`. The texture is reused if its size didn't change.
    pub fn upload_image(&self, id: ImageId, width: u32, height: u32, pixels: &[u8]) {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let mut images = self.inner.images.lock().unwrap();
        let image = images
            .entry(id)
            .and_modify(|image| {
                if image.texture.size() != size {
                    *image = self::create_image(&self.inner.device, size);
                }
            })
            .or_insert_with(|| self::create_image(&self.inner.device, size));

        self.inner.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &image.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
    }

    /// Forgets the image `id`.
    pub fn remove_image(&self, id: ImageId) {
        self.inner.images.lock().unwrap().remove(&id);
    }

    /// Updates the size of the output surface.
    pub fn resize(&self, width: u32, height: u32) {
        self.inner.state.lock().unwrap().size = (width.max(1), height.max(1));
    }

    /// Draws the latest composition into `pass`. If there is none, nothing is drawn and the
    /// output keeps whatever the pass was cleared to.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let state = self.inner.state.lock().unwrap();
        let Some(composition) = state.composition else {
            return;
        };

        let Some((viewport, uv)) = blit::clip(composition.viewport, composition.uv, state.size)
        else {
            return;
        };

        let images = self.inner.images.lock().unwrap();
        let Some(image) = images.get(&composition.image.id) else {
            tracing::warn!(id = ?composition.image.id, "scanout image is not registered");
            return;
        };

        self.inner
            .blitter
            .blit(&self.inner.device, &image.view, viewport, uv, pass);
    }
}

fn create_image(device: &wgpu::Device, size: wgpu::Extent3d) -> Image {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scanout image"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let view = texture.create_view(&Default::default());
    Image { texture, view }
}

impl DisplayModule for Renderer {
    fn size(&self) -> (u32, u32) {
        self.inner.state.lock().unwrap().size
    }

    fn present(&mut self, composition: Option<Composition>) {
        self.inner.state.lock().unwrap().composition = composition;
    }
}
