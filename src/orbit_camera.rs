use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A camera controller that orbits around a target point.
///
/// Left-drag rotates, right-drag pans and scroll zooms.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitCamera::from_position(Vec3::new(-10.0, 30.0, 30.0), Vec3::ZERO)
///     .fov(45.0);
///
/// // In frame loop:
/// orbit.update(frame.input);
/// *frame.camera = orbit.camera();
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch), clamped short of the poles.
    pub elevation: f32,
    /// Field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Fraction of the distance moved per scroll line.
    pub zoom_sensitivity: f32,
    /// Pan distance per pixel, relative to the orbit distance.
    pub pan_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// When false, interactive input is ignored (the pointer belongs to the UI).
    pub enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.3,
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            pan_sensitivity: 0.0015,
            min_distance: 1.0,
            max_distance: 500.0,
            enabled: true,
        }
    }
}

impl OrbitCamera {
    /// Start at `position`, looking at `target`.
    ///
    /// Distance, azimuth and elevation are derived from the offset between
    /// the two points.
    pub fn from_position(position: impl Into<Vec3>, target: impl Into<Vec3>) -> Self {
        let position = position.into();
        let target = target.into();
        let offset = position - target;
        let distance = offset.length();

        let mut orbit = Self {
            target,
            ..Self::default()
        };
        if distance > f32::EPSILON {
            orbit.distance = distance;
            orbit.azimuth = offset.x.atan2(offset.z);
            orbit.elevation = (offset.y / distance)
                .clamp(-1.0, 1.0)
                .asin()
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }
        orbit.max_distance = orbit.max_distance.max(orbit.distance);
        orbit
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Apply this frame's drags and scrolling.
    pub fn update(&mut self, input: &Input) {
        if !self.enabled {
            return;
        }
        let delta = input.mouse_delta();

        if input.mouse_down(MouseButton::Left) {
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation = (self.elevation + delta.y * self.sensitivity)
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }

        if input.mouse_down(MouseButton::Right) {
            let camera = self.camera();
            let forward = camera.forward();
            let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
            let up = right.cross(forward);
            let scale = self.distance * self.pan_sensitivity;
            self.target += (-right * delta.x + up * delta.y) * scale;
        }

        let scroll = input.scroll_delta();
        if scroll.y.abs() > 0.0 {
            let factor = (1.0 - self.zoom_sensitivity).powf(scroll.y);
            self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Get the current camera state.
    pub fn camera(&self) -> Camera {
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );

        Camera {
            position: self.target + offset,
            target: self.target,
            up: Vec3::Y,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_position_reproduces_start() {
        let start = Vec3::new(-10.0, 30.0, 30.0);
        let orbit = OrbitCamera::from_position(start, Vec3::ZERO);
        let camera = orbit.camera();
        assert!((camera.position - start).length() < 1e-3);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn disabled_orbit_ignores_drag() {
        let mut orbit = OrbitCamera::from_position(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
        orbit.enabled = false;
        let before = orbit.camera();
        let input = Input::new();
        orbit.update(&input);
        assert_eq!(orbit.camera(), before);
    }

    #[test]
    fn distant_start_widens_the_zoom_limit() {
        let orbit = OrbitCamera::from_position(Vec3::new(0.0, 0.0, 800.0), Vec3::ZERO);
        assert_eq!(orbit.distance, 800.0);
        assert_eq!(orbit.max_distance, 800.0);
        assert!(orbit.enabled);
    }

    #[test]
    fn elevation_stays_off_the_pole() {
        let orbit = OrbitCamera::from_position(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(orbit.elevation < std::f32::consts::FRAC_PI_2);
    }
}
