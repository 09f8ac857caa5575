//! Lit 3D mesh rendering with depth testing and spot-light shadows.
//!
//! This module provides [`ScenePass`], which draws the scene's meshes with
//! ambient and spot lighting, a shadow-map lookup and linear fog. It is
//! driven by [`SceneNode`](crate::render_graph::SceneNode) and can composite
//! its output over the previous pass.
//!
//! # Architecture
//!
//! The pass uses three bind groups:
//! - **Group 0**: Frame uniforms (camera, lights, fog, viewport), shared with
//!   the shadow, line and particle passes
//! - **Group 1**: Model uniforms (model matrix, normal matrix, color, flags),
//!   bound with a dynamic offset per draw
//! - **Group 2**: The spot light's shadow map and comparison sampler
//!
//! # Pipelines
//!
//! Materials select one of three pipelines: filled with back-face culling,
//! filled double-sided, or wireframe (a line list over the mesh's edge
//! buffer). All of them depth-test with `Less` against a 32-bit depth buffer.
//!
//! # Depth Buffer
//!
//! The pass owns a depth buffer that follows the surface size. Call
//! [`ScenePass::ensure_depth_size`] before rendering if the window may have
//! been resized.

use glam::Mat4;

use crate::camera::Camera;
use crate::fog::Fog;
use crate::gpu::GpuContext;
use crate::light::{AmbientLight, SpotLight};
use crate::material::Material;
use crate::mesh::{Mesh, Transform, Vertex3d};
use crate::shadow::ShadowMap;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Shared WGSL declarations prepended to every shader that reads [`FrameUniforms`].
pub(crate) const FRAME_WGSL: &str = include_str!("shaders/frame.wgsl");

/// Concatenate the frame declarations with a shader body.
pub(crate) fn with_frame(source: &str) -> String {
    format!("{FRAME_WGSL}\n{source}")
}

/// Per-frame uniforms shared by every world-space pass.
///
/// The layout matches `struct Frame` in `shaders/frame.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    pub spot_color: [f32; 4],
    pub spot_cone: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_range: [f32; 4],
    pub viewport: [f32; 4],
}

/// Everything besides the camera that feeds [`FrameUniforms`].
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    pub ambient: &'a AmbientLight,
    pub spot: &'a SpotLight,
    pub fog: Option<&'a Fog>,
    pub particle_size: f32,
    pub particle_rotation: f32,
}

impl FrameUniforms {
    pub fn new(
        camera: &Camera,
        size: (u32, u32),
        time: f32,
        inputs: &FrameInputs,
    ) -> Self {
        let (width, height) = (size.0.max(1) as f32, size.1.max(1) as f32);
        let view = camera.view_matrix();
        let view_proj = camera.projection_matrix(width / height) * view;

        let spot = inputs.spot;
        let [r, g, b, _] = spot.color.linear();
        let shadows = if spot.shadow.enabled { 1.0 } else { 0.0 };
        let light_view_proj = if spot.shadow.enabled {
            spot.shadow_view_projection()
        } else {
            Mat4::IDENTITY
        };
        let ambient = inputs.ambient.radiance();
        let (fog_color, fog_range) = Fog::uniform(inputs.fog);

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            camera_pos: camera.position.extend(time).to_array(),
            ambient: ambient.extend(1.0).to_array(),
            spot_position: spot.position.extend(spot.distance).to_array(),
            spot_direction: spot.direction().extend(spot.decay).to_array(),
            spot_color: [
                r * spot.intensity,
                g * spot.intensity,
                b * spot.intensity,
                shadows,
            ],
            spot_cone: [
                spot.cone_cos(),
                spot.penumbra_cos(),
                spot.shadow.bias,
                1.0 / spot.shadow.map_size.max(1) as f32,
            ],
            fog_color,
            fog_range,
            viewport: [width, height, inputs.particle_size, inputs.particle_rotation],
        }
    }
}

/// Per-draw model uniforms, one slot per draw at a dynamic offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals under non-uniform scale.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub flags: [u32; 4],
}

impl ModelUniforms {
    pub fn new(transform: &Transform, material: &Material) -> Self {
        let model = transform.matrix();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: material.linear_color(),
            flags: [material.flags(), 0, 0, 0],
        }
    }
}

/// A draw call resolved against the scene's mesh list.
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub transform: Transform,
    pub material: Material,
}

/// Round `size` up to the device's uniform offset alignment.
pub(crate) fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Lit mesh rendering with depth testing.
///
/// Owns the frame and model uniform buffers used by every world-space pass
/// in the scene node, the three mesh pipelines, a blit pipeline for the
/// incoming background, and the depth buffer.
pub struct ScenePass {
    filled_pipeline: wgpu::RenderPipeline,
    double_sided_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: wgpu::RenderPipeline,

    frame_buffer: wgpu::Buffer,
    pub(crate) frame_layout: wgpu::BindGroupLayout,
    pub(crate) frame_bind_group: wgpu::BindGroup,

    model_buffer: wgpu::Buffer,
    pub(crate) model_layout: wgpu::BindGroupLayout,
    pub(crate) model_bind_group: wgpu::BindGroup,
    model_capacity: usize,
    model_stride: u64,

    shadow_layout: wgpu::BindGroupLayout,

    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),

    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
}

const INITIAL_MODEL_CAPACITY: usize = 16;

impl ScenePass {
    /// Create the pass rendering into targets of `target_format`.
    pub fn new(gpu: &GpuContext, target_format: wgpu::TextureFormat) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(with_frame(include_str!("shaders/mesh.wgsl")).into()),
        });

        // Frame uniform buffer (group 0)
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Model uniform buffer (group 1), addressed with dynamic offsets
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ModelUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let model_stride = aligned_stride(
            std::mem::size_of::<ModelUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(gpu, &model_layout, model_stride, INITIAL_MODEL_CAPACITY);

        // Shadow map (group 2)
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Sample Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout, &shadow_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline =
            |label: &str, topology: wgpu::PrimitiveTopology, cull_mode: Option<wgpu::Face>| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs"),
                        buffers: &[Vertex3d::LAYOUT],
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
                        topology,
                        cull_mode,
                        front_face: wgpu::FrontFace::Ccw,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            };

        let filled_pipeline = make_pipeline(
            "Scene Filled Pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
        );
        let double_sided_pipeline = make_pipeline(
            "Scene Double-Sided Pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            None,
        );
        let wireframe_pipeline = make_pipeline(
            "Scene Wireframe Pipeline",
            wgpu::PrimitiveTopology::LineList,
            None,
        );

        let depth_view = Self::create_depth_texture(gpu);

        // Blit pipeline for compositing the incoming background
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let blit_bind_group_layout = texture_sampler_layout(device, "Blit Bind Group Layout");

        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&blit_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blit_pipeline = fullscreen_pipeline(
            device,
            "Blit Pipeline",
            &blit_pipeline_layout,
            &blit_shader,
            "fs",
            target_format,
        );

        Self {
            filled_pipeline,
            double_sided_pipeline,
            wireframe_pipeline,
            frame_buffer,
            frame_layout,
            frame_bind_group,
            model_buffer,
            model_layout,
            model_bind_group,
            model_capacity: INITIAL_MODEL_CAPACITY,
            model_stride,
            shadow_layout,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            blit_pipeline,
            blit_bind_group_layout,
            blit_sampler,
        }
    }

    fn create_model_buffer(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_texture(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreate the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            log::debug!("scene depth buffer resized to {}x{}", gpu.width(), gpu.height());
            self.depth_view = Self::create_depth_texture(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Grow the model uniform buffer to hold at least `count` draws.
    pub fn ensure_model_capacity(&mut self, gpu: &GpuContext, count: usize) {
        if count <= self.model_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_model_buffer(gpu, &self.model_layout, self.model_stride, capacity);
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_capacity = capacity;
    }

    /// Byte offset of draw `index` in the model buffer.
    pub(crate) fn model_offset(&self, index: usize) -> u32 {
        (self.model_stride * index as u64) as u32
    }

    pub fn write_frame(&self, gpu: &GpuContext, uniforms: &FrameUniforms) {
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Upload every draw's model uniforms in one write. Draws past the
    /// buffer capacity are skipped by [`render`](Self::render).
    pub fn write_models(&self, gpu: &GpuContext, draw_calls: &[DrawCall]) {
        let count = draw_calls.len().min(self.model_capacity);
        if count == 0 {
            return;
        }
        let mut bytes = vec![0u8; (self.model_stride * count as u64) as usize];
        for (i, call) in draw_calls.iter().take(count).enumerate() {
            let uniforms = ModelUniforms::new(&call.transform, &call.material);
            let start = self.model_offset(i) as usize;
            let data = bytemuck::bytes_of(&uniforms);
            bytes[start..start + data.len()].copy_from_slice(data);
        }
        gpu.queue.write_buffer(&self.model_buffer, 0, &bytes);
    }

    pub(crate) fn model_capacity(&self) -> usize {
        self.model_capacity
    }

    /// Bind group exposing `shadow` to the mesh shader.
    pub fn shadow_bind_group(&self, gpu: &GpuContext, shadow: &ShadowMap) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Sample Bind Group"),
            layout: &self.shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
            ],
        })
    }

    /// Copy `input_view` over the whole target.
    pub fn blit(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        input_view: &wgpu::TextureView,
    ) {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind Group"),
            layout: &self.blit_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });

        render_pass.set_pipeline(&self.blit_pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    /// Draw every call with the pipeline its material selects.
    ///
    /// Frame and model uniforms must already be written for this frame.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass,
        shadow_bind_group: &wgpu::BindGroup,
        draw_calls: &[DrawCall],
    ) {
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        render_pass.set_bind_group(2, shadow_bind_group, &[]);

        for (i, call) in draw_calls.iter().take(self.model_capacity).enumerate() {
            let pipeline = if call.material.wireframe {
                &self.wireframe_pipeline
            } else if call.material.double_sided {
                &self.double_sided_pipeline
            } else {
                &self.filled_pipeline
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &self.model_bind_group, &[self.model_offset(i)]);
            render_pass.set_vertex_buffer(0, call.mesh.vertex_buffer.slice(..));

            if call.material.wireframe {
                render_pass
                    .set_index_buffer(call.mesh.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..call.mesh.edge_count, 0, 0..1);
            } else {
                render_pass
                    .set_index_buffer(call.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..call.mesh.index_count, 0, 0..1);
            }
        }
    }
}

/// Layout with a filterable 2D texture at binding 0 and its sampler at 1.
pub(crate) fn texture_sampler_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
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
    })
}

/// Fullscreen-triangle pipeline without vertex buffers or depth.
pub(crate) fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw2d::Color;
    use glam::Vec3;

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(aligned_stride(160, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(300, 256), 512);
        assert_eq!(aligned_stride(160, 0), 160);
    }

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 160);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 3 * 64 + 9 * 16);
    }

    #[test]
    fn frame_uniforms_pack_light_and_fog() {
        let camera = Camera::new().at([-10.0, 30.0, 30.0]).looking_at([0.0, 0.0, 0.0]);
        let ambient = AmbientLight::new(Color::from_hex(0x333333));
        let mut spot = SpotLight::new(Color::WHITE, 10.0);
        spot.position = Vec3::new(-30.0, 50.0, 0.0);
        spot.angle = 0.2;
        spot.decay = 0.0;
        spot.shadow.enabled = true;
        let fog = Fog::new(Color::from_hex(0x5500af), 0.0, 70.0);

        let inputs = FrameInputs {
            ambient: &ambient,
            spot: &spot,
            fog: Some(&fog),
            particle_size: 0.05,
            particle_rotation: -0.5,
        };
        let u = FrameUniforms::new(&camera, (1280, 720), 2.0, &inputs);

        assert_eq!(u.camera_pos, [-10.0, 30.0, 30.0, 2.0]);
        assert_eq!(u.spot_color, [10.0, 10.0, 10.0, 1.0]);
        assert!((u.spot_cone[0] - 0.2f32.cos()).abs() < 1e-6);
        // No penumbra: both cone edges coincide.
        assert_eq!(u.spot_cone[0], u.spot_cone[1]);
        assert_eq!(u.spot_direction[3], 0.0);
        assert_eq!(u.fog_color[3], 1.0);
        assert_eq!(u.fog_range[1], 70.0);
        assert_eq!(u.viewport, [1280.0, 720.0, 0.05, -0.5]);
    }

    #[test]
    fn model_uniforms_carry_material_flags() {
        let material = Material::hex(0xffffff).double_sided().receives_shadow();
        let u = ModelUniforms::new(&Transform::new(), &material);
        assert_eq!(u.flags[0], 3);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(u.model, glam::Mat4::IDENTITY.to_cols_array_2d());
    }
}
