use glam::{Mat4, Vec2, Vec3};

/// A perspective camera for 3D scenes.
///
/// `fov` is the vertical field of view in radians. Projection uses wgpu's
/// 0..1 depth range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Project a world-space point into normalized device coordinates.
    ///
    /// `z` is the 0..1 depth; points behind the camera come out with `z > 1`.
    pub fn project(&self, world: Vec3, aspect: f32) -> Vec3 {
        self.view_projection(aspect).project_point3(world)
    }
}

/// Map NDC to window pixels (origin top-left, y down).
pub fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new((ndc.x + 1.0) * width / 2.0, (-ndc.y + 1.0) * height / 2.0)
}

/// Map window pixels to NDC (y up).
pub fn screen_to_ndc(position: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(position.x / width * 2.0 - 1.0, -(position.y / height) * 2.0 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_center() {
        let camera = Camera::new()
            .at([-10.0, 30.0, 30.0])
            .looking_at(Vec3::ZERO);
        let ndc = camera.project(Vec3::ZERO, 16.0 / 9.0);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn screen_mapping_round_trips() {
        let (w, h) = (1280.0, 720.0);
        assert_eq!(ndc_to_screen(Vec2::new(-1.0, 1.0), w, h), Vec2::ZERO);
        assert_eq!(ndc_to_screen(Vec2::new(1.0, -1.0), w, h), Vec2::new(w, h));
        assert_eq!(screen_to_ndc(Vec2::new(640.0, 360.0), w, h), Vec2::ZERO);

        let p = Vec2::new(200.0, 500.0);
        let back = ndc_to_screen(screen_to_ndc(p, w, h), w, h);
        assert!((back - p).length() < 1e-3);
    }

    #[test]
    fn points_above_center_project_upwards() {
        let camera = Camera::new().at([0.0, 0.0, 10.0]);
        let ndc = camera.project(Vec3::new(0.0, 1.0, 0.0), 1.0);
        assert!(ndc.y > 0.0);
        assert!(ndc_to_screen(ndc.truncate(), 100.0, 100.0).y < 50.0);
    }
}
