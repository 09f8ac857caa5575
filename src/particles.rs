//! Ambient particle cloud.
//!
//! A fixed set of points scattered uniformly through a cube around the
//! origin, drawn as small camera-facing discs whose on-screen size shrinks
//! with distance. The whole cloud turns slowly about the Y axis.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gpu::GpuContext;
use crate::scene_pass::{DEPTH_FORMAT, with_frame};

/// Angular speed of the cloud about Y, in radians per second.
pub const ROTATION_SPEED: f32 = -0.1;

/// Rotation of the cloud after `elapsed` seconds of visible time.
pub fn rotation_y(elapsed: f32) -> f32 {
    ROTATION_SPEED * elapsed
}

/// Particle positions in the cloud's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleField {
    pub positions: Vec<Vec3>,
}

impl ParticleField {
    /// `count` points uniform in `[-spread/2, spread/2)` on each axis.
    /// The same seed always yields the same field.
    pub fn generate(count: usize, spread: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = (0..count)
            .map(|_| {
                Vec3::new(
                    (rng.r#gen::<f32>() - 0.5) * spread,
                    (rng.r#gen::<f32>() - 0.5) * spread,
                    (rng.r#gen::<f32>() - 0.5) * spread,
                )
            })
            .collect();
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Instanced quad renderer for a [`ParticleField`].
///
/// Particles are transparent white, depth-tested against the scene but do
/// not write depth.
pub struct ParticlePass {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl ParticlePass {
    pub fn new(
        gpu: &GpuContext,
        field: &ParticleField,
        frame_layout: &wgpu::BindGroupLayout,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(
                with_frame(include_str!("shaders/particles.wgsl")).into(),
            ),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[instance_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let positions: Vec<[f32; 3]> = field.positions.iter().map(|p| p.to_array()).collect();
        let instance_buffer = (!positions.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Instance Buffer"),
                contents: bytemuck::cast_slice(&positions),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        log::debug!("uploaded {} particles", positions.len());

        Self {
            pipeline,
            instance_buffer,
            count: positions.len() as u32,
        }
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass, frame_bind_group: &wgpu::BindGroup) {
        let Some(buffer) = &self.instance_buffer else {
            return;
        };
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, frame_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffer.slice(..));
        render_pass.draw(0..6, 0..self.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_stay_inside_the_cube() {
        let field = ParticleField::generate(10_000, 200.0, 7);
        assert_eq!(field.len(), 10_000);
        for p in &field.positions {
            for c in p.to_array() {
                assert!((-100.0..100.0).contains(&c), "{c} outside cube");
            }
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = ParticleField::generate(100, 200.0, 42);
        let b = ParticleField::generate(100, 200.0, 42);
        let c = ParticleField::generate(100, 200.0, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn field_fills_the_cube() {
        let field = ParticleField::generate(10_000, 200.0, 1);
        let mean = field.positions.iter().copied().sum::<Vec3>() / field.len() as f32;
        assert!(mean.length() < 5.0);
        let max_x = field.positions.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert!(max_x > 95.0);
    }

    #[test]
    fn rotation_is_linear_in_time() {
        assert_eq!(rotation_y(0.0), 0.0);
        assert!((rotation_y(10.0) + 1.0).abs() < 1e-6);
        assert!((rotation_y(20.0) - 2.0 * rotation_y(10.0)).abs() < 1e-6);
    }
}
