//! Full-screen backdrop node.

use image::RgbaImage;

use crate::background::BackgroundPass;
use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode};

/// Draws the background image over the whole target.
///
/// Ignores its input, so it belongs at the start of the graph. The backdrop
/// is not fogged.
pub struct BackgroundNode {
    pub pass: BackgroundPass,
}

impl BackgroundNode {
    pub fn new(gpu: &GpuContext, image: &RgbaImage, target_format: wgpu::TextureFormat) -> Self {
        Self {
            pass: BackgroundPass::new(gpu, image, target_format),
        }
    }
}

impl RenderNode for BackgroundNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        _input: Option<&wgpu::TextureView>,
    ) {
        let mut render_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Background Pass"),
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

        self.pass.render(&mut render_pass);
    }
}
