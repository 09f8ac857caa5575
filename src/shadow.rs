//! Spot-light shadow map.
//!
//! Each frame the shadow casters are drawn depth-only from the spot light's
//! point of view into a square depth texture. The mesh shader compares
//! against it through a comparison sampler with a 3×3 filter. Only materials
//! with `cast_shadow` are drawn here and only `receive_shadow` ones sample
//! the result.

use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::scene_pass::{DEPTH_FORMAT, DrawCall, ScenePass, with_frame};

/// Depth texture and comparison sampler for one spot light.
pub struct ShadowMap {
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub size: u32,
}

impl ShadowMap {
    pub fn new(gpu: &GpuContext, size: u32) -> Self {
        let size = size.clamp(1, gpu.device.limits().max_texture_dimension_2d);
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            view,
            sampler,
            size,
        }
    }
}

/// Depth-only pass that fills a [`ShadowMap`].
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    pub map: ShadowMap,
}

impl ShadowPass {
    /// Build the pass against the frame and model layouts of `scene`, so the
    /// same uniforms serve both passes.
    pub fn new(gpu: &GpuContext, scene: &ScenePass, map_size: u32) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(with_frame(include_str!("shaders/shadow.wgsl")).into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&scene.frame_layout, &scene.model_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            map: ShadowMap::new(gpu, map_size),
        }
    }

    /// Clear the map and draw every shadow caster into it.
    ///
    /// `draw_calls` must be the list whose model uniforms `scene` holds, so
    /// draw `i` reads slot `i`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, scene: &ScenePass, draw_calls: &[DrawCall]) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &scene.frame_bind_group, &[]);

        let casters = draw_calls
            .iter()
            .take(scene.model_capacity())
            .enumerate()
            .filter(|(_, call)| call.material.cast_shadow && !call.material.wireframe);
        for (i, call) in casters {
            pass.set_bind_group(1, &scene.model_bind_group, &[scene.model_offset(i)]);
            pass.set_vertex_buffer(0, call.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(call.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..call.mesh.index_count, 0, 0..1);
        }
    }
}
