//! Ray casting against scene colliders.
//!
//! - [`Ray`]: a world-space ray, usually built from the pointer with [`Ray::from_camera`]
//! - [`Collider`]: box, sphere or triangle-mesh shape attached to an entity
//! - [`RayHit`]: the closest intersection found
//!
//! ```ignore
//! if let Some(ndc) = input.pointer_ndc(width, height) {
//!     let ray = Ray::from_camera(ndc, &camera, aspect);
//!     if let Some(hit) = raycast_entity(&world, &ray, torus_knot) {
//!         // hovering
//!     }
//! }
//! ```

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::geometry::RawGeometry;
use crate::mesh::Transform;

/// A ray in 3D space.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray; the direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from the camera through a point in normalized device coordinates.
    ///
    /// The origin is the camera position and the direction passes through the
    /// unprojected NDC point, so hit distances are measured from the eye.
    pub fn from_camera(ndc: Vec2, camera: &Camera, aspect: f32) -> Self {
        let inv_view_proj = camera.view_projection(aspect).inverse();
        let world = inv_view_proj * Vec4::new(ndc.x, ndc.y, 0.5, 1.0);
        let point = world.truncate() / world.w;
        Self::new(camera.position, point - camera.position)
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to the nearest intersection with an axis-aligned box, or to
    /// the exit point when the origin is inside.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab
                if origin < min[i] || origin > max[i] {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min[i] - origin) * inv_dir;
                let mut t2 = (max[i] - origin) * inv_dir;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        if t_min > 0.0 {
            Some(t_min)
        } else if t_max > 0.0 {
            Some(t_max)
        } else {
            None
        }
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 || a <= f32::EPSILON {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// Möller–Trumbore ray/triangle test. Both faces count as hits.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        const EPS: f32 = 1e-7;
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPS).then_some(t)
    }
}

/// Triangle soup with a cached bounding box, shared between colliders.
#[derive(Debug)]
pub struct TriangleMesh {
    triangles: Vec<[Vec3; 3]>,
    min: Vec3,
    max: Vec3,
}

impl TriangleMesh {
    pub fn from_geometry(geometry: &RawGeometry) -> Self {
        let (min, max) = geometry.bounds();
        Self {
            triangles: geometry.triangles().collect(),
            min,
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Closest hit along a model-space ray. `t` is in units of the ray's
    /// direction length.
    fn intersect(&self, ray: &Ray) -> Option<f32> {
        if self.triangles.is_empty() {
            return None;
        }
        ray.intersect_aabb(self.min, self.max).or_else(|| {
            // intersect_aabb misses when the origin is exactly on a face.
            let inside = ray.origin.cmpge(self.min).all() && ray.origin.cmple(self.max).all();
            inside.then_some(0.0)
        })?;

        self.triangles
            .iter()
            .filter_map(|[a, b, c]| ray.intersect_triangle(*a, *b, *c))
            .min_by(f32::total_cmp)
    }
}

/// A collision shape for picking, in the entity's local space.
#[derive(Clone, Debug)]
pub enum Collider {
    /// Box defined by half-extents, rotated and scaled with the entity.
    Box { half_extents: Vec3 },
    /// Sphere of the given radius, scaled by the largest scale axis.
    Sphere { radius: f32 },
    /// Exact triangle mesh.
    Mesh(Arc<TriangleMesh>),
}

impl Collider {
    /// Box collider from full dimensions.
    pub fn box_collider(size: Vec3) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Triangle-accurate collider for the given geometry.
    pub fn mesh(geometry: &RawGeometry) -> Self {
        Self::Mesh(Arc::new(TriangleMesh::from_geometry(geometry)))
    }

    /// Distance from the ray origin to the nearest hit, in world units.
    pub fn intersect(&self, ray: &Ray, transform: &Transform) -> Option<f32> {
        match self {
            Collider::Sphere { radius } => {
                let scale = transform.scale.abs().max_element();
                ray.intersect_sphere(transform.position, radius * scale)
            }
            Collider::Box { half_extents } => {
                let local = local_ray(ray, transform)?;
                local.intersect_aabb(-*half_extents, *half_extents)
            }
            Collider::Mesh(mesh) => {
                let local = local_ray(ray, transform)?;
                mesh.intersect(&local)
            }
        }
    }
}

/// Express a world ray in model space without renormalizing, so the ray
/// parameter keeps measuring world distance.
fn local_ray(ray: &Ray, transform: &Transform) -> Option<Ray> {
    let matrix = transform.matrix();
    if matrix.determinant().abs() <= f32::EPSILON {
        return None;
    }
    let inverse = matrix.inverse();
    Some(Ray {
        origin: inverse.transform_point3(ray.origin),
        direction: inverse.transform_vector3(ray.direction),
    })
}

/// Information about a ray-collider intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub entity: hecs::Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// Cast a ray against a single entity, if it has a transform and collider.
pub fn raycast_entity(world: &hecs::World, ray: &Ray, entity: hecs::Entity) -> Option<RayHit> {
    let mut query = world
        .query_one::<(&Transform, &Collider)>(entity)
        .ok()?;
    let (transform, collider) = query.get()?;
    let distance = collider.intersect(ray, transform)?;
    Some(RayHit {
        entity,
        distance,
        point: ray.point_at(distance),
    })
}

/// Cast a ray against every entity with a collider, closest hits first.
pub fn raycast_all(world: &hecs::World, ray: &Ray) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = world
        .query::<(&Transform, &Collider)>()
        .iter()
        .filter_map(|(entity, (transform, collider))| {
            collider
                .intersect(ray, transform)
                .map(|distance| RayHit {
                    entity,
                    distance,
                    point: ray.point_at(distance),
                })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Cast a ray and return the closest hit.
pub fn raycast(world: &hecs::World, ray: &Ray) -> Option<RayHit> {
    raycast_all(world, ray).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;
    use glam::Quat;

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::new().at([-10.0, 30.0, 30.0]).looking_at(Vec3::ZERO);
        let ray = Ray::from_camera(Vec2::ZERO, &camera, 16.0 / 9.0);
        assert!((ray.origin - camera.position).length() < 1e-5);
        assert!((ray.direction - camera.forward()).length() < 1e-4);
    }

    #[test]
    fn triangle_hits_from_both_sides() {
        let (a, b, c) = (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let front = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert_eq!(front.intersect_triangle(a, b, c), Some(5.0));
        assert_eq!(back.intersect_triangle(a, b, c), Some(5.0));

        let miss = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(miss.intersect_triangle(a, b, c), None);
        let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(behind.intersect_triangle(a, b, c), None);
    }

    #[test]
    fn aabb_and_sphere_distances() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(ray.intersect_aabb(Vec3::splat(-1.0), Vec3::splat(1.0)), Some(9.0));
        assert_eq!(ray.intersect_sphere(Vec3::ZERO, 2.0), Some(8.0));
        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(inside.intersect_sphere(Vec3::ZERO, 2.0), Some(2.0));
    }

    #[test]
    fn mesh_collider_respects_transform() {
        let knot = geometry::torus_knot(2.0, 0.5, 100, 16, 2, 3).unwrap();
        let collider = Collider::mesh(&knot);
        let transform = Transform::from_position(Vec3::new(10.0, 5.0, 0.0));

        // The knot's tube passes through (3, 0, 0) in model space.
        let through_tube = Ray::new(Vec3::new(13.0, 5.0, 20.0), Vec3::NEG_Z);
        let distance = collider.intersect(&through_tube, &transform).unwrap();
        assert!(distance > 18.0 && distance < 20.0);

        // The center of the knot is empty.
        let through_hole = Ray::new(Vec3::new(10.0, 5.0, 20.0), Vec3::NEG_Z);
        assert!(collider.intersect(&through_hole, &transform).is_none());

        // Far to the side.
        let beside = Ray::new(Vec3::new(20.0, 5.0, 20.0), Vec3::NEG_Z);
        assert!(collider.intersect(&beside, &transform).is_none());
    }

    #[test]
    fn scaled_mesh_reports_world_distance() {
        let plane = geometry::plane(2.0, 2.0).unwrap();
        let collider = Collider::mesh(&plane);
        let transform = Transform::new()
            .rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2))
            .uniform_scale(3.0);
        let ray = Ray::new(Vec3::new(2.5, 10.0, 0.0), Vec3::NEG_Y);
        let distance = collider.intersect(&ray, &transform).unwrap();
        assert!((distance - 10.0).abs() < 1e-4);
    }

    #[test]
    fn raycast_picks_closest_entity() {
        let mut world = hecs::World::new();
        let far = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -10.0)),
            Collider::sphere(1.0),
        ));
        let near = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
            Collider::box_collider(Vec3::ONE),
        ));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hit = raycast(&world, &ray).unwrap();
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert_eq!(raycast_all(&world, &ray).len(), 2);

        let only_far = raycast_entity(&world, &ray, far).unwrap();
        assert!((only_far.distance - 9.0).abs() < 1e-5);
    }
}
