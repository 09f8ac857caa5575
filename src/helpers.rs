//! Debug line geometry: axes, ground grid and the spot-light cone.
//!
//! Helpers are plain line lists in world space. They are drawn unlit by
//! [`LinePass`] with depth testing and fog, on top of the background and
//! alongside the meshes.

use glam::Vec3;

use crate::draw2d::Color;
use crate::gpu::GpuContext;
use crate::light::SpotLight;
use crate::scene_pass::{DEPTH_FORMAT, with_frame};

/// A line endpoint with a linear-light color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: Vec3, color: Color) -> Self {
        let [r, g, b, _] = color.linear();
        Self {
            position: position.to_array(),
            color: [r, g, b],
        }
    }
}

fn segment(lines: &mut Vec<LineVertex>, a: Vec3, b: Vec3, color: Color) {
    lines.push(LineVertex::new(a, color));
    lines.push(LineVertex::new(b, color));
}

/// Three segments from the origin: X red, Y green, Z blue.
pub fn axes(size: f32) -> Vec<LineVertex> {
    let mut lines = Vec::with_capacity(6);
    segment(&mut lines, Vec3::ZERO, Vec3::X * size, Color::from_hex(0xff0000));
    segment(&mut lines, Vec3::ZERO, Vec3::Y * size, Color::from_hex(0x00ff00));
    segment(&mut lines, Vec3::ZERO, Vec3::Z * size, Color::from_hex(0x0000ff));
    lines
}

pub const GRID_CENTER_COLOR: Color = Color::rgb(0.267, 0.267, 0.267);
pub const GRID_COLOR: Color = Color::rgb(0.533, 0.533, 0.533);

/// A `size`×`size` grid in the XZ plane with `divisions` cells per side.
///
/// Produces `2 * (divisions + 1)` lines; the middle pair uses `center_color`
/// when `divisions` is even.
pub fn grid(size: f32, divisions: u32, center_color: Color, grid_color: Color) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let center = divisions / 2;

    let mut lines = Vec::with_capacity(4 * (divisions as usize + 1));
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == center && divisions % 2 == 0 {
            center_color
        } else {
            grid_color
        };
        segment(&mut lines, Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k), color);
        segment(&mut lines, Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half), color);
    }
    lines
}

const CONE_SEGMENTS: u32 = 32;
const CONE_LENGTH_UNBOUNDED: f32 = 1000.0;

/// Outline of a spot light's cone: four edges from the apex and the rim.
///
/// The cone reaches the light's cutoff distance, or a fixed length when the
/// light is unbounded.
pub fn spot_light_cone(light: &SpotLight) -> Vec<LineVertex> {
    let color = light.color;
    let length = if light.distance > 0.0 {
        light.distance
    } else {
        CONE_LENGTH_UNBOUNDED
    };
    let radius = length * light.angle.tan();

    let forward = light.direction();
    let helper_up = if forward.abs().abs_diff_eq(Vec3::Y, 1e-4) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let right = forward.cross(helper_up).normalize();
    let up = right.cross(forward);
    let rim = |theta: f32| {
        light.position + forward * length + (right * theta.cos() + up * theta.sin()) * radius
    };

    let mut lines = Vec::with_capacity(2 * (4 + CONE_SEGMENTS as usize));
    for quarter in 0..4 {
        let theta = quarter as f32 * std::f32::consts::FRAC_PI_2;
        segment(&mut lines, light.position, rim(theta), color);
    }
    for i in 0..CONE_SEGMENTS {
        let a = i as f32 / CONE_SEGMENTS as f32 * std::f32::consts::TAU;
        let b = (i + 1) as f32 / CONE_SEGMENTS as f32 * std::f32::consts::TAU;
        segment(&mut lines, rim(a), rim(b), color);
    }
    lines
}

/// Depth-tested, fogged line-list renderer.
pub struct LinePass {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl LinePass {
    pub fn new(
        gpu: &GpuContext,
        frame_layout: &wgpu::BindGroupLayout,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(with_frame(include_str!("shaders/line.wgsl")).into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[LineVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer: None,
            vertex_count: 0,
        }
    }

    /// Replace the uploaded line list.
    pub fn set_lines(&mut self, gpu: &GpuContext, lines: &[LineVertex]) {
        use wgpu::util::DeviceExt;

        self.vertex_count = (lines.len() - lines.len() % 2) as u32;
        self.vertex_buffer = (self.vertex_count > 0).then(|| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Line Vertex Buffer"),
                    contents: bytemuck::cast_slice(lines),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass, frame_bind_group: &wgpu::BindGroup) {
        let Some(buffer) = &self.vertex_buffer else {
            return;
        };
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, frame_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_has_three_colored_segments() {
        let lines = axes(5.0);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1].position, [5.0, 0.0, 0.0]);
        assert_eq!(lines[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(lines[3].position, [0.0, 5.0, 0.0]);
        assert_eq!(lines[5].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn grid_line_count_and_extent() {
        let lines = grid(30.0, 10, GRID_CENTER_COLOR, GRID_COLOR);
        // Two vertices per line, 2 * (10 + 1) lines.
        assert_eq!(lines.len(), 2 * 2 * 11);
        for v in &lines {
            assert_eq!(v.position[1], 0.0);
            assert!(v.position[0].abs() <= 15.0 + 1e-5);
            assert!(v.position[2].abs() <= 15.0 + 1e-5);
        }
    }

    #[test]
    fn grid_center_lines_use_center_color() {
        let center = LineVertex::new(Vec3::ZERO, GRID_CENTER_COLOR).color;
        let lines = grid(30.0, 10, GRID_CENTER_COLOR, GRID_COLOR);
        let centered: Vec<_> = lines.iter().filter(|v| v.color == center).collect();
        assert_eq!(centered.len(), 4);
        assert!(centered.iter().all(|v| v.position[0] == 0.0 || v.position[2] == 0.0));
    }

    #[test]
    fn cone_rim_matches_angle() {
        let mut light = SpotLight::new(Color::WHITE, 1.0);
        light.position = Vec3::new(0.0, 10.0, 0.0);
        light.target = Vec3::ZERO;
        light.angle = 0.5;
        light.distance = 10.0;

        let lines = spot_light_cone(&light);
        assert_eq!(lines.len(), 2 * (4 + 32));
        let apex = Vec3::from_array(lines[0].position);
        let rim = Vec3::from_array(lines[1].position);
        assert!(apex.abs_diff_eq(light.position, 1e-5));
        assert!((rim.y - 0.0).abs() < 1e-4);
        let radius = Vec3::new(rim.x, 0.0, rim.z).length();
        assert!((radius - 10.0 * 0.5f32.tan()).abs() < 1e-3);
    }
}
