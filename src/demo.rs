//! The demo scene: a ground plane, a bouncing sphere and a torus knot under a
//! shadow-casting spot light, wired to the parameter panel and hover modal.
//!
//! [`Demo`] owns all per-frame state and knows nothing about the GPU, so the
//! scene logic can be driven headless. [`setup`] connects it to a window
//! through the app's setup and frame closures.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use hecs::{Entity, World};

use crate::animation::Bounce;
use crate::app::{Frame, SetupContext};
use crate::assets::{Assets, FontId};
use crate::background::BackgroundSource;
use crate::bloom::BloomSettings;
use crate::camera::{Camera, ndc_to_screen};
use crate::config::{HelperConfig, SceneConfig};
use crate::draw2d::{Color, Draw2d};
use crate::ecs::{Bouncing, HoverTarget, MeshId, Name, RenderMesh};
use crate::error::Result;
use crate::fog::Fog;
use crate::geometry::{self, RawGeometry};
use crate::helpers::{self, GRID_CENTER_COLOR, GRID_COLOR, LineVertex};
use crate::light::{AmbientLight, SpotLight, SpotShadow};
use crate::material::Material;
use crate::mesh::{Mesh, Transform};
use crate::modal::HoverModal;
use crate::options::{NumericOption, OptionChange, SceneOptions};
use crate::orbit_camera::OrbitCamera;
use crate::panel::{Panel, PanelInput};
use crate::particles::{self, ParticleField};
use crate::picking::{Collider, Ray, raycast_entity};
use crate::render_graph::{BackgroundNode, BloomNode, HDR_FORMAT, RenderGraph, SceneNode, SceneQueue};

pub const SPHERE_POSITION: Vec3 = Vec3::new(-10.0, 10.0, 0.0);
pub const KNOT_POSITION: Vec3 = Vec3::new(10.0, 5.0, 0.0);
pub const SPOT_POSITION: Vec3 = Vec3::new(-30.0, 50.0, 0.0);

/// Inputs for one [`Demo::update`].
pub struct FrameStep<'a> {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Visible seconds since start.
    pub elapsed: f32,
    pub camera: &'a Camera,
    /// Window size in pixels.
    pub screen: Vec2,
    /// Pointer in NDC, `None` when it is outside the window.
    pub pointer_ndc: Option<Vec2>,
    pub panel_input: PanelInput,
}

/// Scene state that changes from frame to frame.
pub struct Demo {
    pub world: World,
    pub options: SceneOptions,
    pub ambient: AmbientLight,
    pub spot: SpotLight,
    pub fog: Option<Fog>,
    pub bloom: BloomSettings,
    pub bounce: Bounce,
    pub panel: Panel,
    pub modal: HoverModal,
    pub sphere: Entity,
    pub knot: Entity,
    pub particle_rotation: f32,
    pub particle_size: f32,
    helpers: HelperConfig,
    lines_dirty: bool,
    geometry: Vec<(Entity, RawGeometry)>,
}

impl Demo {
    pub fn new(config: &SceneConfig) -> Result<Self> {
        let options = config.options.clone();
        let mut world = World::new();

        let plane = geometry::plane(30.0, 30.0)?;
        let ground = world.spawn((
            Name::new("plane"),
            Transform::new().rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            Material::new(Color::WHITE).double_sided().receives_shadow(),
        ));

        // Starts blue; the option color applies once the panel edits it.
        let sphere_geometry = geometry::sphere(4.0, 50, 50)?;
        let sphere = world.spawn((
            Name::new("sphere"),
            Transform::from_position(SPHERE_POSITION),
            Material::hex(0x0000ff)
                .wireframe(options.wireframe)
                .casts_shadow(),
            Bouncing,
        ));

        let knot_geometry = geometry::torus_knot(2.0, 0.5, 100, 16, 2, 3)?;
        let knot = world.spawn((
            Name::new("torus knot"),
            Transform::from_position(KNOT_POSITION),
            Material::hex(0xff0000).casts_shadow(),
            Collider::mesh(&knot_geometry),
            HoverTarget,
        ));

        let mut spot = SpotLight::new(Color::WHITE, options.intensity);
        spot.position = SPOT_POSITION;
        spot.target = Vec3::ZERO;
        spot.decay = 0.0;
        spot.set_angle(options.angle);
        spot.set_penumbra(options.penumbra);
        spot.shadow = SpotShadow {
            enabled: true,
            ..SpotShadow::default()
        };

        let fog = config.fog.enabled.then(|| {
            let color = Color::from_hex_str(&config.fog.color).unwrap_or(Color::BLACK);
            Fog::new(color, config.fog.near, config.fog.far)
        });

        for (_, name) in world.query_mut::<&Name>() {
            log::debug!("spawned {}", name.0);
        }
        log::info!(
            "scene: {} entities, knot has {} triangles",
            world.len(),
            knot_geometry.triangle_count()
        );

        Ok(Self {
            world,
            bloom: BloomSettings::new(
                options.bloom_threshold,
                options.bloom_strength,
                options.bloom_radius,
            ),
            panel: Panel::for_options(&options),
            modal: HoverModal::new(config.ui.modal_title.clone(), config.ui.modal_lines.clone()),
            options,
            ambient: AmbientLight::new(Color::from_hex(0x333333)),
            spot,
            fog,
            bounce: Bounce::default(),
            sphere,
            knot,
            particle_rotation: 0.0,
            particle_size: config.particles.size,
            helpers: config.helpers.clone(),
            lines_dirty: true,
            geometry: vec![
                (ground, plane),
                (sphere, sphere_geometry),
                (knot, knot_geometry),
            ],
        })
    }

    /// Geometry still waiting to be uploaded, with the entity it belongs to.
    pub fn take_geometry(&mut self) -> Vec<(Entity, RawGeometry)> {
        std::mem::take(&mut self.geometry)
    }

    /// Give `entity` its uploaded mesh so the scene node draws it.
    pub fn attach_mesh(&mut self, entity: Entity, mesh: MeshId) -> Result<()> {
        self.world.insert_one(entity, RenderMesh::new(mesh))?;
        Ok(())
    }

    /// Route a panel edit to the object it drives and remember it.
    pub fn apply_change(&mut self, change: OptionChange) {
        log::debug!("option changed: {change:?}");
        self.options.record(change);
        match change {
            OptionChange::SphereColor(color) => {
                if let Ok(mut material) = self.world.get::<&mut Material>(self.sphere) {
                    material.color = color;
                }
            }
            OptionChange::Wireframe(on) => {
                if let Ok(mut material) = self.world.get::<&mut Material>(self.sphere) {
                    material.wireframe = on;
                }
            }
            OptionChange::Numeric(option, _) => {
                let value = self.options.get(option);
                match option {
                    // Read every frame by the bounce.
                    NumericOption::Speed => {}
                    NumericOption::Angle => {
                        self.spot.set_angle(value);
                        self.lines_dirty |= self.helpers.spot_light;
                    }
                    NumericOption::Penumbra => self.spot.set_penumbra(value),
                    NumericOption::Intensity => self.spot.set_intensity(value),
                    NumericOption::BloomThreshold => self.bloom.threshold = value,
                    NumericOption::BloomStrength => self.bloom.strength = value,
                    NumericOption::BloomRadius => self.bloom.radius = value,
                }
                self.bloom = self.bloom.clamped();
            }
        }
    }

    /// Advance the animation, run the panel and update the hover modal.
    pub fn update(&mut self, step: &FrameStep) {
        for change in self.panel.update(&step.panel_input, step.screen) {
            self.apply_change(change);
        }

        let height = self.bounce.advance(self.options.speed);
        for (_, (transform, _)) in self.world.query_mut::<(&mut Transform, &Bouncing)>() {
            transform.position.y = height;
        }

        self.particle_rotation = particles::rotation_y(step.elapsed);

        let aspect = step.screen.x / step.screen.y.max(1.0);
        let hovered = if self.panel.captures_pointer() {
            false
        } else {
            step.pointer_ndc.is_some_and(|ndc| {
                let ray = Ray::from_camera(ndc, step.camera, aspect);
                self.hover_hit(&ray)
            })
        };

        let anchor = hovered.then(|| self.knot_screen_position(step.camera, step.screen));
        self.modal.update(anchor, step.dt);
    }

    /// Whether `ray` touches a hover target. Other colliders in front of
    /// it do not block the hit.
    pub fn hover_hit(&self, ray: &Ray) -> bool {
        self.world
            .query::<&HoverTarget>()
            .iter()
            .any(|(entity, _)| raycast_entity(&self.world, ray, entity).is_some())
    }

    /// Where the torus knot's origin lands on screen.
    pub fn knot_screen_position(&self, camera: &Camera, screen: Vec2) -> Vec2 {
        let position = self
            .world
            .get::<&Transform>(self.knot)
            .map_or(KNOT_POSITION, |t| t.position);
        let ndc = camera.project(position, screen.x / screen.y.max(1.0));
        ndc_to_screen(ndc.truncate(), screen.x, screen.y)
    }

    /// Axes, grid and the optional spot-light cone.
    pub fn helper_lines(&self) -> Vec<LineVertex> {
        let mut lines = Vec::new();
        if self.helpers.axes {
            lines.extend(helpers::axes(self.helpers.axes_size));
        }
        if self.helpers.grid {
            lines.extend(helpers::grid(
                self.helpers.grid_size,
                self.helpers.grid_divisions,
                GRID_CENTER_COLOR,
                GRID_COLOR,
            ));
        }
        if self.helpers.spot_light {
            lines.extend(helpers::spot_light_cone(&self.spot));
        }
        lines
    }

    /// Replace the render queue's contents with this frame's lights,
    /// particles and draws.
    pub fn sync(&mut self, queue: &mut SceneQueue, bloom: &Cell<BloomSettings>) {
        queue.ambient = self.ambient;
        queue.spot = self.spot;
        queue.fog = self.fog;
        queue.particle_rotation = self.particle_rotation;
        queue.particle_size = self.particle_size;
        if self.lines_dirty {
            queue.set_lines(self.helper_lines());
            self.lines_dirty = false;
        }
        queue.clear_queue();
        queue.queue_world(&self.world);
        bloom.set(self.bloom);
    }

    pub fn draw_overlay(
        &self,
        draw: &mut Draw2d,
        assets: &Assets,
        font: Option<FontId>,
        screen: Vec2,
    ) {
        self.modal.draw(draw, assets, font, screen);
        self.panel.draw(draw, assets, font, screen);
    }
}

/// Build the render graph and scene, and return the per-frame closure.
pub fn setup(ctx: &mut SetupContext) -> Result<impl FnMut(&mut Frame<'_>) + use<>> {
    let config = ctx.config.clone();
    let gpu = ctx.gpu;
    let font = ctx.ui_font();

    let mut demo = Demo::new(&config)?;

    let queue = Rc::new(RefCell::new(SceneQueue::new(demo.ambient, demo.spot, demo.fog)));
    {
        let mut queue = queue.borrow_mut();
        for (entity, geometry) in demo.take_geometry() {
            let mesh = queue.add_mesh(Mesh::from_geometry(gpu, &geometry));
            demo.attach_mesh(entity, mesh)?;
        }
    }

    let background = BackgroundSource::from_config(&config.background).load(&config.background);
    let field = ParticleField::generate(
        config.particles.count as usize,
        config.particles.spread,
        config.particles.seed,
    );
    log::info!("{} particles in a {} unit cube", field.len(), config.particles.spread);

    let bloom = Rc::new(Cell::new(demo.bloom));
    let graph = RenderGraph::builder()
        .node(BackgroundNode::new(gpu, &background, HDR_FORMAT))
        .node(SceneNode::new(gpu, Rc::clone(&queue), HDR_FORMAT).with_particles(gpu, &field, HDR_FORMAT))
        .node(BloomNode::new(gpu, Rc::clone(&bloom), gpu.config.format))
        .build(gpu);
    ctx.render_graph(graph);

    let cam = &config.camera;
    let mut orbit = OrbitCamera::from_position(cam.position, cam.target)
        .fov(cam.fov)
        .planes(cam.near, cam.far);

    Ok(move |frame: &mut Frame<'_>| {
        let screen = Vec2::new(frame.width() as f32, frame.height() as f32);
        let camera = orbit.camera();

        // The panel sees the pointer before the camera does.
        let step = FrameStep {
            dt: frame.dt,
            elapsed: frame.time,
            camera: &camera,
            screen,
            pointer_ndc: frame.input.pointer_ndc(frame.width(), frame.height()),
            panel_input: PanelInput::from_input(frame.input),
        };
        demo.update(&step);

        orbit.enabled = !demo.panel.captures_pointer();
        orbit.update(frame.input);
        *frame.camera = orbit.camera();

        demo.sync(&mut queue.borrow_mut(), &bloom);
        demo.draw_overlay(frame.draw, frame.assets, font, screen);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> Demo {
        Demo::new(&SceneConfig::default()).unwrap()
    }

    fn step(camera: &Camera, pointer_ndc: Option<Vec2>) -> FrameStep<'_> {
        FrameStep {
            dt: 1.0 / 60.0,
            elapsed: 1.0,
            camera,
            screen: Vec2::new(1280.0, 720.0),
            pointer_ndc,
            panel_input: PanelInput::default(),
        }
    }

    #[test]
    fn sphere_starts_blue_and_takes_panel_color() {
        let mut demo = demo();
        let color = demo.world.get::<&Material>(demo.sphere).unwrap().color;
        assert_eq!(color.to_hex_string(), "#0000ff");

        demo.apply_change(OptionChange::SphereColor(Color::from_hex(0xffea00)));
        let material = *demo.world.get::<&Material>(demo.sphere).unwrap();
        assert_eq!(material.color.to_hex_string(), "#ffea00");
        assert_eq!(demo.options.sphere_color, "#ffea00");
    }

    #[test]
    fn numeric_changes_reach_light_and_bloom() {
        let mut demo = demo();
        demo.apply_change(OptionChange::Numeric(NumericOption::Angle, 0.5));
        demo.apply_change(OptionChange::Numeric(NumericOption::Intensity, 3.0));
        demo.apply_change(OptionChange::Numeric(NumericOption::BloomStrength, 2.0));
        demo.apply_change(OptionChange::Numeric(NumericOption::Penumbra, 7.0));
        assert_eq!(demo.spot.angle, 0.5);
        assert_eq!(demo.spot.intensity, 3.0);
        assert_eq!(demo.bloom.strength, 2.0);
        // Clamped to the slider range before it reaches the light.
        assert_eq!(demo.spot.penumbra, 1.0);
        assert_eq!(demo.options.penumbra, 1.0);
    }

    #[test]
    fn update_bounces_the_sphere() {
        let mut demo = demo();
        let camera = Camera::new();
        demo.update(&step(&camera, None));
        let y = demo.world.get::<&Transform>(demo.sphere).unwrap().position.y;
        assert!((y - 5.0 * 0.005f32.sin()).abs() < 1e-6);
        assert!((demo.particle_rotation + 0.1).abs() < 1e-6);
    }

    #[test]
    fn wireframe_toggle_reaches_material() {
        let mut demo = demo();
        demo.apply_change(OptionChange::Wireframe(true));
        assert!(demo.world.get::<&Material>(demo.sphere).unwrap().wireframe);
    }

    #[test]
    fn helper_lines_follow_config() {
        let demo = demo();
        // Axes (6 vertices) and an 11x2 line grid.
        assert_eq!(demo.helper_lines().len(), 6 + 44);
    }

    #[test]
    fn attaching_to_a_despawned_entity_fails() {
        let mut demo = demo();
        demo.attach_mesh(demo.knot, MeshId(0)).unwrap();
        assert_eq!(demo.world.get::<&RenderMesh>(demo.knot).unwrap().mesh, MeshId(0));

        demo.world.despawn(demo.sphere).unwrap();
        let err = demo.attach_mesh(demo.sphere, MeshId(1)).unwrap_err();
        assert!(matches!(err, crate::Error::MissingEntity(_)));
    }

    #[test]
    fn geometry_is_handed_out_once() {
        let mut demo = demo();
        assert_eq!(demo.take_geometry().len(), 3);
        assert!(demo.take_geometry().is_empty());
    }
}
