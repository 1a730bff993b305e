use glam::Vec4;
use rdp::modules::display::{UvRect, Viewport};
use wesl::include_wesl;
use zerocopy::IntoBytes;

/// Clips `viewport` to an output of size `output`, shrinking `uv` by the same proportion.
///
/// Returns `None` if nothing of the viewport is visible.
pub fn clip(viewport: Viewport, uv: UvRect, output: (u32, u32)) -> Option<(Viewport, UvRect)> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }

    let (output_width, output_height) = (output.0 as f32, output.1 as f32);
    let left = viewport.x.max(0.0);
    let top = viewport.y.max(0.0);
    let right = (viewport.x + viewport.width).min(output_width);
    let bottom = (viewport.y + viewport.height).min(output_height);

    if right <= left || bottom <= top {
        return None;
    }

    let lerp = |from: f32, to: f32, t: f32| from + (to - from) * t;
    let [u0, v0] = uv.top_left;
    let [u1, v1] = uv.bottom_right;

    let clipped_uv = UvRect {
        top_left: [
            lerp(u0, u1, (left - viewport.x) / viewport.width),
            lerp(v0, v1, (top - viewport.y) / viewport.height),
        ],
        bottom_right: [
            lerp(u0, u1, (right - viewport.x) / viewport.width),
            lerp(v0, v1, (bottom - viewport.y) / viewport.height),
        ],
    };

    let clipped = Viewport {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    };

    Some((clipped, clipped_uv))
}

/// Draws scanout images into a viewport of the output, sampling only a rectangle of them.
pub struct ScanoutBlitter {
    group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
}

impl ScanoutBlitter {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&group_layout],
            push_constant_ranges: &[wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::VERTEX,
                range: 0..16,
            }],
        });

        let shader = include_wesl!("scanout_blit");
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scanout blit"),
            source: wgpu::ShaderSource::Wgsl(shader.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scanout blit pipeline"),
            layout: Some(&layout),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::all(),
                })],
            }),
            multisample: Default::default(),
            depth_stencil: None,
            multiview: None,
            cache: None,
        });

        // cropped edges must not bleed in from the other side
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            group_layout,
            pipeline,
            sampler,
        }
    }

    /// Draws `uv` of `texture` into `viewport`, which must lie inside the pass target.
    pub fn blit(
        &self,
        device: &wgpu::Device,
        texture: &wgpu::TextureView,
        viewport: Viewport,
        uv: UvRect,
        pass: &mut wgpu::RenderPass<'_>,
    ) {
        let uvs = Vec4::new(
            uv.top_left[0],
            uv.top_left[1],
            uv.bottom_right[0],
            uv.bottom_right[1],
        );

        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &self.group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_push_constants(wgpu::ShaderStages::VERTEX, 0, uvs.as_bytes());
        pass.set_bind_group(0, &group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(x: f32, y: f32, width: f32, height: f32) -> Viewport {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn inside_is_untouched() {
        let vp = viewport(240.0, 0.0, 1440.0, 1080.0);
        let (clipped, uv) = clip(vp, UvRect::FULL, (1920, 1080)).unwrap();

        assert_eq!(clipped, vp);
        assert_eq!(uv, UvRect::FULL);
    }

    #[test]
    fn overflow_shrinks_uvs() {
        let vp = viewport(-160.0, -120.0, 640.0, 480.0);
        let (clipped, uv) = clip(vp, UvRect::FULL, (320, 240)).unwrap();

        assert_eq!(clipped, viewport(0.0, 0.0, 320.0, 240.0));
        assert_eq!(uv, UvRect {
            top_left: [0.25, 0.25],
            bottom_right: [0.75, 0.75],
        });
    }

    #[test]
    fn clipping_keeps_crop() {
        let vp = viewport(0.0, -100.0, 400.0, 400.0);
        let crop = UvRect {
            top_left: [0.0, 0.125],
            bottom_right: [1.0, 0.875],
        };

        let (clipped, uv) = clip(vp, crop, (400, 200)).unwrap();
        assert_eq!(clipped, viewport(0.0, 0.0, 400.0, 200.0));
        assert_eq!(uv.top_left, [0.0, 0.3125]);
        assert_eq!(uv.bottom_right, [1.0, 0.6875]);
    }

    #[test]
    fn invisible_viewports() {
        assert!(clip(viewport(0.0, 0.0, 0.0, 10.0), UvRect::FULL, (10, 10)).is_none());
        assert!(clip(viewport(20.0, 0.0, 10.0, 10.0), UvRect::FULL, (10, 10)).is_none());
        assert!(clip(viewport(0.0, 0.0, 10.0, 10.0), UvRect::FULL, (0, 0)).is_none());
    }
}
