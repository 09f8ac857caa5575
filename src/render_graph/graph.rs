//! Render graph construction and execution.

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode, RenderTarget};

/// Builder for a [`RenderGraph`]; nodes run in the order they are added.
pub struct RenderGraphBuilder {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl RenderGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn node<N: RenderNode + 'static>(mut self, node: N) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    pub fn build(self, gpu: &GpuContext) -> RenderGraph {
        // Two HDR targets, alternated between nodes.
        let target_a = RenderTarget::new(gpu, "RenderGraph Target A");
        let target_b = RenderTarget::new(gpu, "RenderGraph Target B");

        RenderGraph {
            nodes: self.nodes,
            target_a,
            target_b,
        }
    }
}

impl Default for RenderGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to a frame handed to [`RenderGraph::execute_with_ui`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The surface was unavailable; it has been reconfigured where that
    /// helps and the next frame should succeed.
    Skipped,
    /// The GPU ran out of memory. Rendering cannot continue.
    OutOfMemory,
}

/// A linear chain of render nodes with ping-pong intermediate targets.
pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderNode>>,
    target_a: RenderTarget,
    target_b: RenderTarget,
}

impl RenderGraph {
    pub fn builder() -> RenderGraphBuilder {
        RenderGraphBuilder::new()
    }

    /// Let every node follow the surface size and upload pending data.
    pub fn prepare(&mut self, gpu: &GpuContext) {
        for node in &mut self.nodes {
            node.prepare(gpu);
        }
        self.target_a.ensure_size(gpu, "RenderGraph Target A");
        self.target_b.ensure_size(gpu, "RenderGraph Target B");
    }

    /// Render one frame through every node, then run `ui_fn` in an overlay
    /// pass on the screen, and present.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn execute_with_ui<F>(
        &mut self,
        gpu: &GpuContext,
        time: f32,
        camera: &Camera,
        ui_fn: F,
    ) -> FrameOutcome
    where
        F: FnOnce(&GpuContext, &mut wgpu::RenderPass),
    {
        self.prepare(gpu);

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                return FrameOutcome::Skipped;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return FrameOutcome::OutOfMemory,
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return FrameOutcome::Skipped;
            }
        };
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph Encoder"),
            });

        let node_count = self.nodes.len();

        {
            let mut ctx = RenderContext {
                gpu,
                encoder: &mut encoder,
                time,
                camera,
            };

            // Ping-pong between targets, final pass goes to screen
            let mut current_input: Option<&wgpu::TextureView> = None;

            for (i, node) in self.nodes.iter().enumerate() {
                let is_last = i + 1 == node_count;

                let target = if is_last {
                    &screen_view
                } else if i % 2 == 0 {
                    &self.target_a.view
                } else {
                    &self.target_b.view
                };

                node.execute(&mut ctx, target, current_input);

                if !is_last {
                    current_input = Some(target);
                }
            }
        }

        {
            let load = if node_count == 0 {
                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
            } else {
                wgpu::LoadOp::Load
            };
            let mut ui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            ui_fn(gpu, &mut ui_pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        FrameOutcome::Presented
    }
}
