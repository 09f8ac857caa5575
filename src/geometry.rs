//! CPU-side geometry and the parametric primitives used by the scene.
//!
//! Generators produce a [`RawGeometry`] that can be inspected, transformed and
//! used for picking before it is uploaded as a [`Mesh`]:
//!
//! ```ignore
//! use stellar::geometry;
//!
//! let knot = geometry::torus_knot(2.0, 0.5, 100, 16, 2, 3)?;
//! let collider = Collider::mesh(&knot);
//! let mesh = knot.upload(&gpu);
//! ```
//!
//! Winding is counter-clockwise when viewed from the side the normals point
//! to, so back-face culling with `FrontFace::Ccw` keeps the outside.

use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use glam::{Quat, Vec3};

/// Rejected generator parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry parameter `{name}` must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("geometry parameter `{name}` must be at least {min}, got {value}")]
    TooFewSegments {
        name: &'static str,
        value: u32,
        min: u32,
    },
    #[error("torus knot winding numbers must be non-zero, got p = {p}, q = {q}")]
    DegenerateKnot { p: u32, q: u32 },
}

fn positive(name: &'static str, value: f32) -> Result<f32, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::NotPositive { name, value })
    }
}

fn segments(name: &'static str, value: u32, min: u32) -> Result<u32, GeometryError> {
    if value >= min {
        Ok(value)
    } else {
        Err(GeometryError::TooFewSegments { name, value, min })
    }
}

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    /// Creates raw geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Scales all vertices uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factor).into();
        }
    }

    /// Rotates all vertices and normals by the given quaternion.
    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position)).into();
            v.normal = (rotation * Vec3::from(v.normal)).into();
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangle corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize].position),
                Vec3::from(self.vertices[tri[1] as usize].position),
                Vec3::from(self.vertices[tri[2] as usize].position),
            ]
        })
    }

    /// Unique undirected edges of all triangles, as a line-list index buffer.
    ///
    /// Degenerate edges (both ends the same index) are skipped.
    pub fn edges(&self) -> Vec<u32> {
        let mut unique = BTreeSet::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                if a != b {
                    unique.insert((a.min(b), a.max(b)));
                }
            }
        }
        unique.into_iter().flat_map(|(a, b)| [a, b]).collect()
    }

    /// Recalculates vertex normals from face geometry.
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::from_geometry(gpu, self)
    }
}

/// Indices for a `(columns + 1) × (rows + 1)` vertex grid, two triangles per cell.
///
/// `skip_first_row`/`skip_last_row` drop the degenerate triangles at sphere poles.
fn grid_indices(columns: u32, rows: u32, skip_first_row: bool, skip_last_row: bool) -> Vec<u32> {
    let stride = columns + 1;
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for iy in 0..rows {
        for ix in 0..columns {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if !(skip_first_row && iy == 0) {
                indices.extend_from_slice(&[a, b, d]);
            }
            if !(skip_last_row && iy == rows - 1) {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    indices
}

/// A `width × height` rectangle in the XY plane, centered on the origin and
/// facing +Z.
pub fn plane(width: f32, height: f32) -> Result<RawGeometry, GeometryError> {
    let width = positive("width", width)?;
    let height = positive("height", height)?;
    let (hw, hh) = (width / 2.0, height / 2.0);

    let mut vertices = Vec::with_capacity(4);
    for iy in 0..=1 {
        for ix in 0..=1 {
            let x = ix as f32 * width - hw;
            let y = hh - iy as f32 * height;
            vertices.push(Vertex3d::new(
                [x, y, 0.0],
                [0.0, 0.0, 1.0],
                [ix as f32, 1.0 - iy as f32],
            ));
        }
    }

    Ok(RawGeometry::new(vertices, grid_indices(1, 1, false, false)))
}

/// A UV sphere of the given radius centered on the origin.
pub fn sphere(
    radius: f32,
    width_segments: u32,
    height_segments: u32,
) -> Result<RawGeometry, GeometryError> {
    let radius = positive("radius", radius)?;
    let width_segments = segments("width_segments", width_segments, 3)?;
    let height_segments = segments("height_segments", height_segments, 2)?;

    let mut vertices =
        Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // Shift pole UVs half a segment so each pole triangle samples its own column.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex3d::new(
                (normal * radius).into(),
                normal.into(),
                [u + u_offset, 1.0 - v],
            ));
        }
    }

    let indices = grid_indices(width_segments, height_segments, true, true);
    Ok(RawGeometry::new(vertices, indices))
}

/// A point on the `(p, q)` torus knot curve.
fn knot_point(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vec3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * qu_over_p.sin() * 0.5,
    )
}

/// A tube of radius `tube` swept along the `(p, q)` torus knot.
///
/// The knot winds `p` times around its axis of rotational symmetry and `q`
/// times around a circle in its interior. The tube cross-section is oriented
/// with an approximate Frenet frame sampled a small step ahead on the curve.
pub fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> Result<RawGeometry, GeometryError> {
    let radius = positive("radius", radius)?;
    let tube = positive("tube", tube)?;
    let tubular_segments = segments("tubular_segments", tubular_segments, 3)?;
    let radial_segments = segments("radial_segments", radial_segments, 3)?;
    if p == 0 || q == 0 {
        return Err(GeometryError::DegenerateKnot { p, q });
    }
    let (pf, qf) = (p as f32, q as f32);

    let mut vertices =
        Vec::with_capacity(((tubular_segments + 1) * (radial_segments + 1)) as usize);
    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * pf * TAU;

        let p1 = knot_point(u, pf, qf, radius);
        let p2 = knot_point(u + 0.01, pf, qf, radius);

        let tangent = p2 - p1;
        let mut normal = p2 + p1;
        let binormal = tangent.cross(normal).normalize();
        normal = binormal.cross(tangent).normalize();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();

            let position = p1 + normal * cx + binormal * cy;
            let vertex_normal = (position - p1).normalize_or_zero();
            vertices.push(Vertex3d::new(
                position.into(),
                vertex_normal.into(),
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
            ));
        }
    }

    let stride = radial_segments + 1;
    let mut indices = Vec::with_capacity((tubular_segments * radial_segments * 6) as usize);
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Ok(RawGeometry::new(vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(tri: [Vec3; 3]) -> Vec3 {
        (tri[1] - tri[0]).cross(tri[2] - tri[0])
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn translate_and_scale_move_the_center() {
        let mut geom = sphere(1.0, 8, 6).unwrap();
        geom.scale(2.0);
        geom.translate(Vec3::new(3.0, 0.0, 0.0));
        let (min, max) = geom.bounds();
        assert!((geom.center() - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);
        assert!((max.y - min.y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn plane_faces_positive_z() {
        let plane = plane(30.0, 30.0).unwrap();
        assert_eq!(plane.triangle_count(), 2);
        for tri in plane.triangles() {
            assert!(face_normal(tri).z > 0.0);
        }
        let (min, max) = plane.bounds();
        assert_eq!(min, Vec3::new(-15.0, -15.0, 0.0));
        assert_eq!(max, Vec3::new(15.0, 15.0, 0.0));
    }

    #[test]
    fn rotated_plane_faces_up() {
        let mut plane = plane(2.0, 2.0).unwrap();
        plane.rotate(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        for tri in plane.triangles() {
            assert!(face_normal(tri).y > 0.0);
        }
        assert!((Vec3::from(plane.vertices[0].normal) - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn sphere_vertices_lie_on_radius_and_wind_outwards() {
        let sphere = sphere(4.0, 50, 50).unwrap();
        assert_eq!(sphere.vertices.len(), 51 * 51);
        // The pole rows contribute one triangle per segment instead of two.
        assert_eq!(sphere.triangle_count(), 50 * 50 * 2 - 2 * 50);
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 4.0).abs() < 1e-4);
        }
        for tri in sphere.triangles() {
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(face_normal(tri).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn torus_knot_counts_and_extent() {
        let knot = torus_knot(2.0, 0.5, 100, 16, 2, 3).unwrap();
        assert_eq!(knot.vertices.len(), 101 * 17);
        assert_eq!(knot.triangle_count(), 100 * 16 * 2);

        // Curve radius peaks at 1.5 * radius, plus the tube.
        let (min, max) = knot.bounds();
        assert!(max.x <= 3.0 + 0.5 + 1e-3);
        assert!(min.x >= -3.5 - 1e-3);
        assert!(max.z <= 1.0 + 0.5 + 1e-3);
    }

    #[test]
    fn torus_knot_normals_point_away_from_curve() {
        let knot = torus_knot(2.0, 0.5, 64, 8, 2, 3).unwrap();
        for v in &knot.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn edges_are_unique_and_undirected() {
        let plane = plane(1.0, 1.0).unwrap();
        let edges = plane.edges();
        // Four sides plus the shared diagonal.
        assert_eq!(edges.len(), 5 * 2);
        let pairs: BTreeSet<(u32, u32)> =
            edges.chunks_exact(2).map(|e| (e[0], e[1])).collect();
        assert_eq!(pairs.len(), 5);
        assert!(pairs.iter().all(|(a, b)| a < b));
    }

    #[test]
    fn recalculated_normals_match_generated_ones() {
        let original = plane(2.0, 2.0).unwrap();
        let mut recomputed = original.clone();
        recomputed.recalculate_normals();
        for (a, b) in original.vertices.iter().zip(&recomputed.vertices) {
            assert!((Vec3::from(a.normal) - Vec3::from(b.normal)).length() < 1e-5);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            plane(0.0, 1.0),
            Err(GeometryError::NotPositive { name: "width", .. })
        ));
        assert!(matches!(
            sphere(f32::NAN, 8, 8),
            Err(GeometryError::NotPositive { .. })
        ));
        assert!(matches!(
            sphere(1.0, 2, 8),
            Err(GeometryError::TooFewSegments { min: 3, .. })
        ));
        assert_eq!(
            torus_knot(2.0, 0.5, 100, 16, 0, 3).unwrap_err(),
            GeometryError::DegenerateKnot { p: 0, q: 3 }
        );
    }
}
