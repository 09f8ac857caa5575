//! The step interface shared by every pass in the graph.

use crate::gpu::GpuContext;
use crate::render_graph::RenderContext;

/// A single step of the frame.
///
/// `execute` records commands that draw into `target`. `input` is the
/// previous node's output, or `None` for the first node.
pub trait RenderNode {
    fn execute(
        &self,
        ctx: &mut RenderContext,
        target: &wgpu::TextureView,
        input: Option<&wgpu::TextureView>,
    );

    /// Called with mutable access before every frame, to follow the surface
    /// size or upload data that changed since the last frame.
    fn prepare(&mut self, _gpu: &GpuContext) {}
}
