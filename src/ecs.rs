//! ECS components for the scene's entities.
//!
//! Entities live in a `hecs::World`. Anything with a [`Transform`](crate::Transform),
//! [`RenderMesh`] and [`Material`](crate::Material) is drawn by the scene node;
//! a [`Collider`](crate::Collider) makes it pickable.
//!
//! ```ignore
//! world.spawn((
//!     Name::new("sphere"),
//!     Transform::from_position(Vec3::new(-10.0, 10.0, 0.0)),
//!     RenderMesh::new(sphere_mesh),
//!     Material::hex(0x0000ff).casts_shadow(),
//!     Bouncing,
//! ));
//! ```

/// Handle to a mesh uploaded to the scene queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Draw this entity's transform with the given mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderMesh {
    pub mesh: MeshId,
}

impl RenderMesh {
    pub fn new(mesh: MeshId) -> Self {
        Self { mesh }
    }
}

/// Human-readable label, used in logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks the entity whose height follows the bounce animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bouncing;

/// Marks the entity that opens the hover modal when the pointer is over it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverTarget;
