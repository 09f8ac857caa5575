use stellar::demo::KNOT_POSITION;
use stellar::{
    Binding, Camera, Collider, Color, Demo, FrameStep, Material, NumericOption, OptionChange,
    PanelInput, Ray, RowKind, SceneConfig, Transform, Vec2, Vec3, geometry, raycast,
};

const SCREEN: Vec2 = Vec2::new(1280.0, 720.0);
const DT: f32 = 1.0 / 60.0;

fn default_camera() -> Camera {
    let config = SceneConfig::default();
    Camera::new()
        .at(config.camera.position)
        .looking_at(config.camera.target)
        .with_fov(config.camera.fov)
        .with_planes(config.camera.near, config.camera.far)
}

fn step(camera: &Camera, pointer_ndc: Option<Vec2>, panel_input: PanelInput) -> FrameStep<'_> {
    FrameStep {
        dt: DT,
        elapsed: 0.0,
        camera,
        screen: SCREEN,
        pointer_ndc,
        panel_input,
    }
}

/// Centre of a knot triangle that faces the camera well enough to be hit.
fn knot_surface_point(camera: &Camera) -> Vec3 {
    let knot = geometry::torus_knot(2.0, 0.5, 100, 16, 2, 3).unwrap();
    knot.triangles()
        .map(|[a, b, c]| {
            let centre = (a + b + c) / 3.0 + KNOT_POSITION;
            let normal = (b - a).cross(c - a).normalize();
            let view = (centre - camera.position).normalize();
            (centre, normal.dot(view).abs())
        })
        .find(|(_, facing)| *facing > 0.5)
        .map(|(centre, _)| centre)
        .unwrap()
}

#[test]
fn ray_from_default_camera_hits_the_knot() {
    let demo = Demo::new(&SceneConfig::default()).unwrap();
    let camera = default_camera();

    let target = knot_surface_point(&camera);
    let ray = Ray::new(camera.position, target - camera.position);
    assert!(demo.hover_hit(&ray));

    let sky = Ray::new(camera.position, Vec3::Y);
    assert!(!demo.hover_hit(&sky));
}

#[test]
fn objects_in_front_of_the_knot_do_not_block_the_hover() {
    let mut demo = Demo::new(&SceneConfig::default()).unwrap();
    let camera = default_camera();

    let target = knot_surface_point(&camera);
    let midway = camera.position.lerp(target, 0.5);
    let blocker = demo.world.spawn((
        Transform::from_position(midway),
        Collider::box_collider(Vec3::splat(4.0)),
    ));

    let ray = Ray::new(camera.position, target - camera.position);
    let closest = raycast(&demo.world, &ray).unwrap();
    assert_eq!(closest.entity, blocker);
    assert!(demo.hover_hit(&ray));
}

#[test]
fn hovering_the_knot_opens_the_modal_until_the_pointer_leaves() {
    let mut demo = Demo::new(&SceneConfig::default()).unwrap();
    let camera = default_camera();
    let aspect = SCREEN.x / SCREEN.y;

    let target = knot_surface_point(&camera);
    let ndc = camera.project(target, aspect).truncate();
    // Pointer over the knot, panel untouched.
    demo.update(&step(&camera, Some(ndc), PanelInput::default()));
    assert!(demo.modal.is_displayed());
    assert_eq!(demo.modal.target_opacity(), 1.0);
    let anchor = demo.knot_screen_position(&camera, SCREEN);
    assert!(demo.modal.position().abs_diff_eq(anchor, 1e-3));

    // Pointer in the empty sky above the scene.
    let sky = Vec2::new(0.0, 0.95);
    demo.update(&step(&camera, Some(sky), PanelInput::default()));
    assert!(demo.modal.is_displayed());
    assert_eq!(demo.modal.target_opacity(), 0.0);

    for _ in 0..30 {
        demo.update(&step(&camera, Some(sky), PanelInput::default()));
    }
    assert!(!demo.modal.is_displayed());
    assert_eq!(demo.modal.opacity(), 0.0);
}

#[test]
fn panel_clicks_drive_the_sphere() {
    let mut demo = Demo::new(&SceneConfig::default()).unwrap();
    let camera = default_camera();

    let slot = demo.panel.find(Binding::Wireframe).unwrap();
    let row = demo
        .panel
        .layout(SCREEN.x)
        .into_iter()
        .find(|row| row.kind == RowKind::Controller(slot))
        .unwrap();
    let click = PanelInput {
        pointer: Some(Vec2::new(row.rect.x + 10.0, row.rect.y + 10.0)),
        pressed: true,
        down: true,
        ..PanelInput::default()
    };

    demo.update(&step(&camera, None, click));
    let material = *demo.world.get::<&Material>(demo.sphere).unwrap();
    assert!(material.wireframe);
    assert!(demo.options.wireframe);
    assert!(demo.panel.captures_pointer());
}

#[test]
fn option_changes_reach_the_scene() {
    let mut demo = Demo::new(&SceneConfig::default()).unwrap();

    demo.apply_change(OptionChange::SphereColor(Color::from_hex(0x00ff00)));
    demo.apply_change(OptionChange::Numeric(NumericOption::BloomThreshold, 0.5));
    demo.apply_change(OptionChange::Numeric(NumericOption::BloomRadius, -3.0));
    demo.apply_change(OptionChange::Numeric(NumericOption::Speed, 0.1));

    let material = *demo.world.get::<&Material>(demo.sphere).unwrap();
    assert_eq!(material.color.to_hex_string(), "#00ff00");
    assert_eq!(demo.bloom.threshold, 0.5);
    assert_eq!(demo.bloom.radius, 0.0);
    assert_eq!(demo.options.speed, 0.1);

    // Speed feeds the bounce on the next frame.
    let camera = default_camera();
    demo.update(&step(&camera, None, PanelInput::default()));
    let y = demo.world.get::<&Transform>(demo.sphere).unwrap().position.y;
    assert!((y - 5.0 * 0.1f32.sin()).abs() < 1e-5);
}

#[test]
fn configured_options_seed_the_scene() {
    let config = SceneConfig::from_toml_str(
        "[options]\nangle = 0.6\nintensity = 4.0\nbloom_strength = 2.5\n",
        "test.toml",
    )
    .unwrap();
    let demo = Demo::new(&config).unwrap();
    assert_eq!(demo.spot.angle, 0.6);
    assert_eq!(demo.spot.intensity, 4.0);
    assert_eq!(demo.bloom.strength, 2.5);
    // The sphere keeps its initial blue until the panel changes it.
    let material = *demo.world.get::<&Material>(demo.sphere).unwrap();
    assert_eq!(material.color.to_hex_string(), "#0000ff");
}
