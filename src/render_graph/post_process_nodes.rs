//! Post-processing nodes.

use std::cell::Cell;
use std::rc::Rc;

use crate::bloom::{BloomPass, BloomSettings};
use crate::gpu::GpuContext;
use crate::render_graph::{RenderContext, RenderNode};

/// Applies bloom to the previous pass's output.
///
/// Settings are shared with the application through an `Rc<Cell<_>>`, so
/// panel changes take effect on the next frame.
///
/// # Requirements
///
/// This node needs a previous pass in the graph; as the first node it
/// only clears its target.
pub struct BloomNode {
    pub pass: BloomPass,
    pub settings: Rc<Cell<BloomSettings>>,
}

impl BloomNode {
    pub fn new(
        gpu: &GpuContext,
        settings: Rc<Cell<BloomSettings>>,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            pass: BloomPass::new(gpu, output_format),
            settings,
        }
    }
}

impl RenderNode for BloomNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    ) {
        let Some(input_view) = input else {
            log::debug!("bloom node has no input; clearing its target");
            let _clear_pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Clear Pass"),
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
            return;
        };

        let settings = self.settings.get().clamped();
        self.pass
            .render(ctx.gpu, ctx.encoder, &settings, input_view, target);
    }

    fn prepare(&mut self, gpu: &GpuContext) {
        self.pass.ensure_size(gpu);
    }
}
