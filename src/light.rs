//! Scene lights and their attenuation model.
//!
//! Falloff follows the usual physically based conventions: a spot light's
//! cone fades between its outer angle and `angle * (1 - penumbra)`, and
//! distance falloff is an inverse power law with an optional smooth cutoff.

use glam::{Mat4, Vec3};

use crate::draw2d::Color;

/// Uniform light reaching every surface regardless of orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            intensity: 1.0,
        }
    }

    /// Linear radiance contribution.
    pub fn radiance(&self) -> Vec3 {
        let [r, g, b, _] = self.color.linear();
        Vec3::new(r, g, b) * self.intensity
    }
}

/// Shadow map parameters for a spot light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotShadow {
    pub enabled: bool,
    /// Edge length of the square depth map.
    pub map_size: u32,
    /// Depth bias subtracted before the comparison.
    pub bias: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SpotShadow {
    fn default() -> Self {
        Self {
            enabled: false,
            map_size: 1024,
            bias: 0.0005,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// A cone of light from `position` towards `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone, measured from the edge, that fades out.
    pub penumbra: f32,
    /// Distance falloff exponent; 0 disables falloff.
    pub decay: f32,
    /// Cutoff distance; 0 means unlimited.
    pub distance: f32,
    pub shadow: SpotShadow,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            target: Vec3::ZERO,
            color: Color::WHITE,
            intensity: 1.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            decay: 2.0,
            distance: 0.0,
            shadow: SpotShadow::default(),
        }
    }
}

impl SpotLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity: intensity.max(0.0),
            ..Self::default()
        }
    }

    /// Unit direction from the light towards its target.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = clamp_or(angle, 0.0, std::f32::consts::FRAC_PI_2, self.angle);
    }

    pub fn set_penumbra(&mut self, penumbra: f32) {
        self.penumbra = clamp_or(penumbra, 0.0, 1.0, self.penumbra);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = clamp_or(intensity, 0.0, f32::MAX, self.intensity);
    }

    /// Cosine of the outer cone edge.
    pub fn cone_cos(&self) -> f32 {
        self.angle.cos()
    }

    /// Cosine of the angle where the penumbra ends and full intensity begins.
    pub fn penumbra_cos(&self) -> f32 {
        (self.angle * (1.0 - self.penumbra)).cos()
    }

    /// Angular falloff for a point whose direction from the light makes
    /// `cos_theta` with the cone axis.
    pub fn cone_attenuation(&self, cos_theta: f32) -> f32 {
        let outer = self.cone_cos();
        let inner = self.penumbra_cos();
        if inner - outer <= f32::EPSILON {
            // A hard edge when there is no penumbra.
            return if cos_theta > outer { 1.0 } else { 0.0 };
        }
        smoothstep(outer, inner, cos_theta)
    }

    pub fn distance_attenuation(&self, distance: f32) -> f32 {
        if self.decay <= 0.0 && self.distance <= 0.0 {
            return 1.0;
        }
        let mut falloff = 1.0 / distance.powf(self.decay).max(0.01);
        if self.distance > 0.0 {
            let ratio = distance / self.distance;
            falloff *= (1.0 - ratio.powi(4)).clamp(0.0, 1.0).powi(2);
        }
        falloff
    }

    /// Total attenuation of the light reaching `point`, ignoring occlusion.
    pub fn attenuation_at(&self, point: Vec3) -> f32 {
        let to_point = point - self.position;
        let distance = to_point.length();
        if distance <= f32::EPSILON {
            return 1.0;
        }
        let cos_theta = (to_point / distance).dot(self.direction());
        self.cone_attenuation(cos_theta) * self.distance_attenuation(distance)
    }

    /// View-projection used to render and sample the shadow map.
    ///
    /// The frustum's full field of view is twice the cone half-angle so the
    /// whole cone is covered.
    pub fn shadow_view_projection(&self) -> Mat4 {
        let fov = (2.0 * self.angle).clamp(0.01, std::f32::consts::PI - 0.01);
        let far = if self.distance > 0.0 {
            self.distance
        } else {
            self.shadow.far
        };
        let direction = self.direction();
        // look_at degenerates when looking straight along the up vector.
        let up = if direction.abs().abs_diff_eq(Vec3::Y, 1e-4) {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let projection = Mat4::perspective_rh(fov, 1.0, self.shadow.near, far);
        projection * view
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_spot() -> SpotLight {
        let mut light = SpotLight::new(Color::WHITE, 10.0);
        light.position = Vec3::new(-30.0, 50.0, 0.0);
        light.angle = 0.2;
        light.decay = 0.0;
        light
    }

    #[test]
    fn hard_cone_without_penumbra() {
        let light = scene_spot();
        assert_eq!(light.cone_attenuation(1.0), 1.0);
        assert_eq!(light.cone_attenuation(0.2f32.cos() + 1e-4), 1.0);
        assert_eq!(light.cone_attenuation(0.2f32.cos() - 1e-4), 0.0);
    }

    #[test]
    fn penumbra_fades_smoothly() {
        let mut light = scene_spot();
        light.set_penumbra(0.5);
        let inner = light.penumbra_cos();
        let outer = light.cone_cos();
        assert_eq!(light.cone_attenuation(inner), 1.0);
        assert_eq!(light.cone_attenuation(outer), 0.0);
        let mid = light.cone_attenuation((inner + outer) / 2.0);
        assert!((mid - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_decay_means_no_distance_falloff() {
        let light = scene_spot();
        assert_eq!(light.distance_attenuation(1.0), 1.0);
        assert_eq!(light.distance_attenuation(1000.0), 1.0);
        assert_eq!(light.attenuation_at(Vec3::ZERO), 1.0);
    }

    #[test]
    fn cutoff_distance_reaches_zero() {
        let mut light = scene_spot();
        light.decay = 2.0;
        light.distance = 10.0;
        assert_eq!(light.distance_attenuation(10.0), 0.0);
        assert!((light.distance_attenuation(2.0) - 0.25 * (1.0 - 0.0016f32).powi(2)).abs() < 1e-5);
    }

    #[test]
    fn setters_clamp() {
        let mut light = scene_spot();
        light.set_angle(3.0);
        assert_eq!(light.angle, std::f32::consts::FRAC_PI_2);
        light.set_penumbra(-1.0);
        assert_eq!(light.penumbra, 0.0);
        light.set_intensity(f32::NAN);
        assert_eq!(light.intensity, 10.0);
        light.set_intensity(-2.0);
        assert_eq!(light.intensity, 0.0);
    }

    #[test]
    fn shadow_frustum_centers_the_target() {
        let light = scene_spot();
        let clip = light.shadow_view_projection() * light.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn ambient_radiance_is_linear() {
        let ambient = AmbientLight::new(Color::from_hex(0x333333));
        let r = ambient.radiance().x;
        assert!((r - 0.0331).abs() < 1e-3);
    }
}
