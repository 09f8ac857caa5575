//! Lit scene rendering with deferred draw queuing.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{MeshId, RenderMesh};
use crate::fog::Fog;
use crate::gpu::GpuContext;
use crate::helpers::{LinePass, LineVertex};
use crate::light::{AmbientLight, SpotLight};
use crate::material::Material;
use crate::mesh::{Mesh, Transform};
use crate::particles::{ParticleField, ParticlePass};
use crate::render_graph::{RenderContext, RenderNode};
use crate::scene_pass::{DrawCall, FrameInputs, FrameUniforms, ScenePass};
use crate::shadow::ShadowPass;

/// A queued mesh draw stored in the shared scene queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueuedDraw {
    pub mesh: MeshId,
    pub transform: Transform,
    pub material: Material,
}

/// Shared storage for meshes, lights, fog and the per-frame draw queue.
///
/// `SceneQueue` is wrapped in `Rc<RefCell<>>` and shared between the
/// application, which fills it every frame, and the [`SceneNode`] that
/// renders it.
///
/// # Usage Pattern
///
/// ```ignore
/// // Setup: create queue and register meshes
/// let queue = Rc::new(RefCell::new(SceneQueue::new(ambient, spot, Some(fog))));
/// let sphere = queue.borrow_mut().add_mesh(Mesh::from_geometry(&gpu, &geometry));
///
/// // Each frame: queue draw calls
/// queue.borrow_mut().queue_world(&world);
///
/// // Render graph processes the queue
/// graph.execute_with_ui(&gpu, time, &camera, |_, _| {});
///
/// // After frame: clear for next frame
/// queue.borrow_mut().clear_queue();
/// ```
pub struct SceneQueue {
    /// Registered meshes, indexed by the ids returned from [`add_mesh`](Self::add_mesh).
    pub meshes: Vec<Mesh>,
    /// Per-frame draw queue, cleared at the end of each frame.
    pub draw_queue: Vec<QueuedDraw>,
    pub ambient: AmbientLight,
    pub spot: SpotLight,
    pub fog: Option<Fog>,
    /// World-space particle diameter.
    pub particle_size: f32,
    /// Rotation of the particle cloud about Y, in radians.
    pub particle_rotation: f32,
    lines: Vec<LineVertex>,
    lines_dirty: bool,
}

impl SceneQueue {
    pub fn new(ambient: AmbientLight, spot: SpotLight, fog: Option<Fog>) -> Self {
        Self {
            meshes: Vec::new(),
            draw_queue: Vec::new(),
            ambient,
            spot,
            fog,
            particle_size: 0.05,
            particle_rotation: 0.0,
            lines: Vec::new(),
            lines_dirty: false,
        }
    }

    /// Registers a mesh and returns a handle for later use.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let idx = self.meshes.len();
        self.meshes.push(mesh);
        MeshId(idx)
    }

    /// Queues a mesh for rendering this frame.
    pub fn draw(&mut self, mesh: MeshId, transform: Transform, material: Material) {
        self.draw_queue.push(QueuedDraw {
            mesh,
            transform,
            material,
        });
    }

    /// Queue every entity that has a transform, a mesh and a material.
    pub fn queue_world(&mut self, world: &hecs::World) {
        for (_, (transform, render, material)) in world
            .query::<(&Transform, &RenderMesh, &Material)>()
            .iter()
        {
            self.draw(render.mesh, *transform, *material);
        }
    }

    /// Replace the helper line list; uploaded before the next frame.
    pub fn set_lines(&mut self, lines: Vec<LineVertex>) {
        self.lines = lines;
        self.lines_dirty = true;
    }

    pub fn lines(&self) -> &[LineVertex] {
        &self.lines
    }

    fn take_dirty_lines(&mut self) -> Option<&[LineVertex]> {
        if !self.lines_dirty {
            return None;
        }
        self.lines_dirty = false;
        Some(&self.lines)
    }

    /// Clears the draw queue for the next frame. Meshes, lights and lines
    /// are kept.
    pub fn clear_queue(&mut self) {
        self.draw_queue.clear();
    }
}

/// Render node for the lit 3D scene.
///
/// Renders, in order: the spot light's shadow map, the previous pass's
/// output as background, every queued mesh, the helper lines, and the
/// particle cloud. All world-space passes share one depth buffer and one
/// set of frame uniforms.
pub struct SceneNode {
    pub pass: ScenePass,
    shadow: ShadowPass,
    shadow_bind_group: wgpu::BindGroup,
    lines: LinePass,
    particles: Option<ParticlePass>,
    pub queue: Rc<RefCell<SceneQueue>>,
    /// Used when the node has no input to draw over.
    pub clear_color: wgpu::Color,
}

impl SceneNode {
    pub fn new(
        gpu: &GpuContext,
        queue: Rc<RefCell<SceneQueue>>,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let pass = ScenePass::new(gpu, target_format);
        let map_size = queue.borrow().spot.shadow.map_size;
        let shadow = ShadowPass::new(gpu, &pass, map_size);
        let shadow_bind_group = pass.shadow_bind_group(gpu, &shadow.map);
        let lines = LinePass::new(gpu, &pass.frame_layout, target_format);

        Self {
            pass,
            shadow,
            shadow_bind_group,
            lines,
            particles: None,
            queue,
            clear_color: wgpu::Color::BLACK,
        }
    }

    /// Draw `field` as the particle cloud.
    pub fn with_particles(
        mut self,
        gpu: &GpuContext,
        field: &ParticleField,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        self.particles = Some(ParticlePass::new(
            gpu,
            field,
            &self.pass.frame_layout,
            target_format,
        ));
        self
    }
}

impl RenderNode for SceneNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    ) {
        let queue = self.queue.borrow();

        // Build draw calls from the queue
        let draw_calls: Vec<DrawCall> = queue
            .draw_queue
            .iter()
            .filter_map(|q| {
                queue.meshes.get(q.mesh.0).map(|mesh| DrawCall {
                    mesh,
                    transform: q.transform,
                    material: q.material,
                })
            })
            .collect();

        let inputs = FrameInputs {
            ambient: &queue.ambient,
            spot: &queue.spot,
            fog: queue.fog.as_ref(),
            particle_size: queue.particle_size,
            particle_rotation: queue.particle_rotation,
        };
        let size = (ctx.gpu.width(), ctx.gpu.height());
        let uniforms = FrameUniforms::new(ctx.camera, size, ctx.time, &inputs);
        self.pass.write_frame(ctx.gpu, &uniforms);
        self.pass.write_models(ctx.gpu, &draw_calls);

        if queue.spot.shadow.enabled {
            self.shadow.render(ctx.encoder, &self.pass, &draw_calls);
        }

        // Composite the previous pass first as the background
        if let Some(input_view) = input {
            let mut blit_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Blit Pass"),
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
            });
            self.pass.blit(ctx.gpu, &mut blit_pass, input_view);
        }

        let load_op = if input.is_some() {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(self.clear_color)
        };

        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.pass.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.pass
            .render(&mut render_pass, &self.shadow_bind_group, &draw_calls);
        self.lines.render(&mut render_pass, &self.pass.frame_bind_group);
        // Transparent, so last.
        if let Some(particles) = &self.particles {
            particles.render(&mut render_pass, &self.pass.frame_bind_group);
        }
    }

    fn prepare(&mut self, gpu: &GpuContext) {
        self.pass.ensure_depth_size(gpu);

        let mut queue = self.queue.borrow_mut();
        self.pass.ensure_model_capacity(gpu, queue.draw_queue.len());
        if let Some(lines) = queue.take_dirty_lines() {
            self.lines.set_lines(gpu, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw2d::Color;
    use crate::ecs::Name;
    use glam::Vec3;

    fn queue() -> SceneQueue {
        SceneQueue::new(
            AmbientLight::new(Color::from_hex(0x333333)),
            SpotLight::new(Color::WHITE, 10.0),
            None,
        )
    }

    #[test]
    fn queue_world_collects_drawable_entities() {
        let mut world = hecs::World::new();
        world.spawn((
            Transform::from_position(Vec3::new(-10.0, 10.0, 0.0)),
            RenderMesh::new(MeshId(0)),
            Material::hex(0x0000ff),
        ));
        world.spawn((
            Transform::new(),
            RenderMesh::new(MeshId(1)),
            Material::hex(0xff0000),
        ));
        // Not drawable: no mesh.
        world.spawn((Name::new("marker"), Transform::new()));

        let mut q = queue();
        q.queue_world(&world);
        assert_eq!(q.draw_queue.len(), 2);
        assert!(q.draw_queue.iter().any(|d| d.mesh == MeshId(0)
            && d.transform.position == Vec3::new(-10.0, 10.0, 0.0)));

        q.clear_queue();
        assert!(q.draw_queue.is_empty());
    }

    #[test]
    fn lines_are_uploaded_once_per_change() {
        let mut q = queue();
        assert!(q.take_dirty_lines().is_none());
        q.set_lines(crate::helpers::axes(5.0));
        assert_eq!(q.take_dirty_lines().map(<[_]>::len), Some(6));
        assert!(q.take_dirty_lines().is_none());
        assert_eq!(q.lines().len(), 6);
    }
}
