//! # Stellar
//!
//! **A small wgpu scene renderer with a live parameter panel.**
//!
//! The crate renders one scene: a ground plane, a bouncing sphere and a torus
//! knot under a shadow-casting spot light, with fog, a starfield backdrop,
//! an ambient particle cloud and bloom. A panel in the corner edits the
//! scene while it runs, and hovering the knot opens a card that follows it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stellar::{SceneConfig, demo, run};
//!
//! fn main() -> stellar::Result<()> {
//!     run(SceneConfig::default(), demo::setup)
//! }
//! ```
//!
//! ## Layout
//!
//! - **Frame loop**: [`run`] opens the window and calls a setup closure once,
//!   then the frame closure it returns every redraw.
//! - **Rendering**: a [`RenderGraph`] chains the background, the lit scene
//!   and bloom through HDR targets, then draws a 2D overlay on top.
//! - **Scene state**: entities live in a `hecs` [`World`]; [`Demo`] owns
//!   everything that changes per frame and never touches the GPU.
//! - **Configuration**: [`SceneConfig`] is read from TOML, with defaults
//!   matching the scene described above.

mod animation;
mod app;
mod assets;
mod background;
mod bloom;
mod camera;
mod config;
pub mod demo;
mod draw2d;
mod ecs;
mod error;
mod fog;
pub mod geometry;
mod gpu;
mod helpers;
mod input;
mod light;
mod material;
mod mesh;
mod modal;
mod options;
mod orbit_camera;
mod panel;
mod particles;
mod picking;
mod render_graph;
mod scene_pass;
mod shadow;
mod texture;

pub use animation::{Bounce, FrameClock};
pub use app::{Frame, SetupContext, run};
pub use assets::{Assets, FontAtlas, FontId};
pub use background::{BackgroundSource, Starfield};
pub use bloom::BloomSettings;
pub use camera::{Camera, ndc_to_screen, screen_to_ndc};
pub use config::{
    BackgroundConfig, CameraConfig, DEFAULT_CONFIG_FILE, FogConfig, HelperConfig, ParticleConfig,
    SceneConfig, UiConfig, WindowConfig,
};
pub use demo::{Demo, FrameStep};
pub use draw2d::{Color, Draw2d, Rect};
pub use error::{Error, Result};
pub use fog::Fog;
pub use geometry::{GeometryError, RawGeometry};
pub use gpu::GpuContext;
pub use helpers::LineVertex;
pub use input::Input;
pub use light::{AmbientLight, SpotLight, SpotShadow};
pub use material::Material;
pub use mesh::{Mesh, Transform, Vertex3d};
pub use modal::HoverModal;
pub use options::{NumericOption, OptionChange, SceneOptions};
pub use orbit_camera::OrbitCamera;
pub use panel::{
    Binding, Channel, Controller, ControllerKind, Folder, Panel, PanelInput, Row, RowKind, Slot,
};
pub use particles::ParticleField;
pub use render_graph::{
    BackgroundNode, BloomNode, FrameOutcome, HDR_FORMAT, RenderContext, RenderGraph,
    RenderGraphBuilder, RenderNode, RenderTarget, SceneNode, SceneQueue,
};
pub use texture::Texture;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

// ECS support and picking
pub use ecs::{Bouncing, HoverTarget, MeshId, Name, RenderMesh};
pub use hecs::{Entity, World};
pub use picking::{Collider, Ray, RayHit, raycast, raycast_entity};
