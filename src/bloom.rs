//! Bloom post-processing.
//!
//! Three steps run at half resolution before the composite:
//!
//! 1. **Bright pass**: keep pixels whose luminance is above `threshold`,
//!    with a narrow soft knee so the cutoff doesn't alias.
//! 2. **Blur**: a separable gaussian, horizontal then vertical. `radius`
//!    widens the spacing between taps.
//! 3. **Composite**: `scene + strength * bloom`, written to the output.

use crate::gpu::GpuContext;
use crate::render_graph::HDR_FORMAT;
use crate::scene_pass::fullscreen_pipeline;

/// Number of one-sided taps in the blur kernel, matching `TAPS` in `bloom.wgsl`.
pub const BLUR_TAPS: usize = 8;
const BLUR_SIGMA: f32 = 3.0;
const KNEE: f32 = 0.01;

/// Tunable bloom parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            strength: 1.5,
            radius: 0.4,
        }
    }
}

impl BloomSettings {
    pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 1.0);
    pub const STRENGTH_RANGE: (f32, f32) = (0.0, 3.0);
    pub const RADIUS_RANGE: (f32, f32) = (0.0, 1.0);

    pub fn new(threshold: f32, strength: f32, radius: f32) -> Self {
        Self {
            threshold,
            strength,
            radius,
        }
        .clamped()
    }

    /// Every field clamped to its range; NaN becomes the range minimum.
    pub fn clamped(self) -> Self {
        let clamp = |v: f32, (lo, hi): (f32, f32)| if v.is_nan() { lo } else { v.clamp(lo, hi) };
        Self {
            threshold: clamp(self.threshold, Self::THRESHOLD_RANGE),
            strength: clamp(self.strength, Self::STRENGTH_RANGE),
            radius: clamp(self.radius, Self::RADIUS_RANGE),
        }
    }

    /// Texel spacing between blur taps.
    pub fn spread(&self) -> f32 {
        0.5 + self.radius * 2.5
    }
}

/// One-sided gaussian weights, centre first.
///
/// The mirrored kernel `w[taps-1] .. w[1] w[0] w[1] .. w[taps-1]` sums to 1.
pub fn gaussian_weights(taps: usize, sigma: f32) -> Vec<f32> {
    if taps == 0 {
        return Vec::new();
    }
    let sigma = sigma.max(1e-3);
    let raw: Vec<f32> = (0..taps)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
    raw.into_iter().map(|w| w / total).collect()
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomUniforms {
    texel: [f32; 2],
    direction: [f32; 2],
    threshold: f32,
    knee: f32,
    strength: f32,
    spread: f32,
    weights: [[f32; 4]; 2],
}

impl BloomUniforms {
    fn new(settings: &BloomSettings, texel: [f32; 2], direction: [f32; 2]) -> Self {
        let mut weights = [[0.0; 4]; 2];
        for (i, w) in gaussian_weights(BLUR_TAPS, BLUR_SIGMA).into_iter().enumerate() {
            weights[i / 4][i % 4] = w;
        }
        Self {
            texel,
            direction,
            threshold: settings.threshold,
            knee: KNEE,
            strength: settings.strength,
            spread: settings.spread(),
            weights,
        }
    }
}

struct HalfTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl HalfTarget {
    fn new(gpu: &GpuContext, label: &str) -> Self {
        let width = (gpu.width() / 2).max(1);
        let height = (gpu.height() / 2).max(1);
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            width,
            height,
        }
    }

    fn texel(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }
}

/// GPU side of the bloom effect.
pub struct BloomPass {
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    input_layout: wgpu::BindGroupLayout,
    bloom_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    // bright, horizontal, vertical, composite
    uniform_buffers: [wgpu::Buffer; 4],
    ping: HalfTarget,
    pong: HalfTarget,
    size: (u32, u32),
}

impl BloomPass {
    /// Create the pass; the composite writes `output_format`.
    pub fn new(gpu: &GpuContext, output_format: wgpu::TextureFormat) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/bloom.wgsl").into()),
        });

        let input_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Input Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bloom_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Texture Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let single_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&input_layout],
            push_constant_ranges: &[],
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Composite Pipeline Layout"),
            bind_group_layouts: &[&input_layout, &bloom_layout],
            push_constant_ranges: &[],
        });

        let bright_pipeline = fullscreen_pipeline(
            device,
            "Bloom Bright Pipeline",
            &single_layout,
            &shader,
            "fs_bright",
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "Bloom Blur Pipeline",
            &single_layout,
            &shader,
            "fs_blur",
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Bloom Composite Pipeline",
            &composite_layout,
            &shader,
            "fs_composite",
            output_format,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buffers = ["Bright", "Blur H", "Blur V", "Composite"].map(|stage| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Bloom {stage} Uniforms")),
                size: std::mem::size_of::<BloomUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        Self {
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            input_layout,
            bloom_layout,
            sampler,
            uniform_buffers,
            ping: HalfTarget::new(gpu, "Bloom Ping"),
            pong: HalfTarget::new(gpu, "Bloom Pong"),
            size: (gpu.width(), gpu.height()),
        }
    }

    /// Recreate the half-resolution targets if the surface size changed.
    pub fn ensure_size(&mut self, gpu: &GpuContext) {
        if self.size != (gpu.width(), gpu.height()) {
            self.ping = HalfTarget::new(gpu, "Bloom Ping");
            self.pong = HalfTarget::new(gpu, "Bloom Pong");
            self.size = (gpu.width(), gpu.height());
        }
    }

    fn input_group(
        &self,
        gpu: &GpuContext,
        uniforms: &wgpu::Buffer,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Input Bind Group"),
            layout: &self.input_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Record the whole effect: `input` is the rendered scene, `target`
    /// receives the composite.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        settings: &BloomSettings,
        input: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) {
        let full_texel = [1.0 / gpu.width() as f32, 1.0 / gpu.height() as f32];
        let half_texel = self.ping.texel();
        let stages = [
            BloomUniforms::new(settings, full_texel, [0.0, 0.0]),
            BloomUniforms::new(settings, half_texel, [1.0, 0.0]),
            BloomUniforms::new(settings, half_texel, [0.0, 1.0]),
            BloomUniforms::new(settings, full_texel, [0.0, 0.0]),
        ];
        for (buffer, uniforms) in self.uniform_buffers.iter().zip(&stages) {
            gpu.queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
        }

        // scene -> ping (bright), ping -> pong (horizontal), pong -> ping (vertical)
        let steps = [
            (&self.bright_pipeline, input, &self.ping.view, "Bloom Bright Pass"),
            (&self.blur_pipeline, &self.ping.view, &self.pong.view, "Bloom Blur H Pass"),
            (&self.blur_pipeline, &self.pong.view, &self.ping.view, "Bloom Blur V Pass"),
        ];
        for (i, (pipeline, source, destination, label)) in steps.into_iter().enumerate() {
            let bind_group = self.input_group(gpu, &self.uniform_buffers[i], source);
            let mut pass = begin_fullscreen(encoder, destination, label);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let scene_group = self.input_group(gpu, &self.uniform_buffers[3], input);
        let bloom_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Texture Bind Group"),
            layout: &self.bloom_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&self.ping.view),
            }],
        });
        let mut pass = begin_fullscreen(encoder, target, "Bloom Composite Pass");
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &scene_group, &[]);
        pass.set_bind_group(1, &bloom_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn begin_fullscreen<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_and_decrease() {
        for taps in [1, 2, 5, BLUR_TAPS] {
            let w = gaussian_weights(taps, BLUR_SIGMA);
            assert_eq!(w.len(), taps);
            let total = w[0] + 2.0 * w[1..].iter().sum::<f32>();
            assert!((total - 1.0).abs() < 1e-5, "taps {taps}: {total}");
            assert!(w.windows(2).all(|pair| pair[0] >= pair[1]));
        }
        assert!(gaussian_weights(0, 1.0).is_empty());
    }

    #[test]
    fn single_tap_is_identity() {
        assert_eq!(gaussian_weights(1, 2.0), vec![1.0]);
    }

    #[test]
    fn settings_clamp_to_ranges() {
        let s = BloomSettings::new(1.5, -1.0, f32::NAN);
        assert_eq!(s.threshold, 1.0);
        assert_eq!(s.strength, 0.0);
        assert_eq!(s.radius, 0.0);
        assert_eq!(BloomSettings::default().clamped(), BloomSettings::default());
    }

    #[test]
    fn radius_widens_the_blur() {
        let narrow = BloomSettings::new(0.85, 1.5, 0.0);
        let wide = BloomSettings::new(0.85, 1.5, 1.0);
        assert!(wide.spread() > narrow.spread());
        assert!(narrow.spread() > 0.0);
    }

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<BloomUniforms>(), 64);
        let u = BloomUniforms::new(&BloomSettings::default(), [0.5, 0.5], [1.0, 0.0]);
        assert_eq!(u.weights[1][3], gaussian_weights(BLUR_TAPS, BLUR_SIGMA)[7]);
    }
}
