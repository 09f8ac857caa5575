//! Off-screen HDR targets and what a node records a frame with.

use crate::camera::Camera;
use crate::gpu::GpuContext;

/// Format of the graph's off-screen targets. Values above 1.0 survive until
/// the final node so bloom can pick them up.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// An off-screen color target the size of the surface.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
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
            texture,
            view,
            width: gpu.width(),
            height: gpu.height(),
        }
    }

    /// Recreate the target if the surface was resized.
    pub fn ensure_size(&mut self, gpu: &GpuContext, label: &str) {
        if self.width != gpu.width() || self.height != gpu.height() {
            log::debug!("{label} resized to {}x{}", gpu.width(), gpu.height());
            *self = Self::new(gpu, label);
        }
    }
}

/// What a node gets to record a frame with.
pub struct RenderContext<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Seconds of visible time since start.
    pub time: f32,
    pub camera: &'a Camera,
}
