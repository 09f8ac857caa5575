//! GPU meshes and spatial transforms.
//!
//! - [`Vertex3d`]: the vertex format shared by every lit mesh
//! - [`Mesh`]: GPU-resident triangle and edge buffers
//! - [`Transform`]: position, rotation and scale for placing meshes
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] occupies 32 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use glam::{Mat4, Quat, Vec3};

/// Lit mesh vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident mesh geometry.
///
/// Besides the triangle index buffer, every mesh carries a line-list buffer of
/// its unique edges so it can be drawn as a wireframe without the
/// `POLYGON_MODE_LINE` device feature.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) edge_buffer: wgpu::Buffer,
    pub(crate) edge_count: u32,
}

impl Mesh {
    /// Upload vertices and triangle indices; edges are derived from the triangles.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        Self::from_geometry(gpu, &RawGeometry::new(vertices.to_vec(), indices.to_vec()))
    }

    pub fn from_geometry(gpu: &GpuContext, geometry: &RawGeometry) -> Self {
        use wgpu::util::DeviceExt;

        let edges = geometry.edges();

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let edge_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Edge Buffer"),
                contents: bytemuck::cast_slice(&edges),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
        }
    }
}

/// Position, rotation and scale of an object in world space.
///
/// ```
/// use stellar::{Transform, Vec3, Quat};
///
/// let ground = Transform::new().rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
/// let sphere = Transform::from_position(Vec3::new(-10.0, 10.0, 0.0));
/// assert_eq!(sphere.position.y, 10.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }

    #[test]
    fn matrix_applies_scale_before_translation() {
        let transform = Transform::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .uniform_scale(2.0);
        let p = transform.matrix().transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Vec3::new(3.0, 2.0, 0.0));
    }
}
