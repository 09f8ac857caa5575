use crate::draw2d::Color;

/// Linear distance fog.
///
/// Surfaces blend towards `color` as their view distance goes from `near`
/// to `far`. The background is not fogged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }

    /// Fraction of fog color at `distance`, in `[0, 1]`.
    pub fn factor(&self, distance: f32) -> f32 {
        let span = self.far - self.near;
        if span <= 0.0 {
            return if distance >= self.far { 1.0 } else { 0.0 };
        }
        ((distance - self.near) / span).clamp(0.0, 1.0)
    }

    /// Fog as packed for shaders: linear rgb plus an enabled flag, and the range.
    pub(crate) fn uniform(fog: Option<&Fog>) -> ([f32; 4], [f32; 4]) {
        match fog {
            Some(fog) => {
                let [r, g, b, _] = fog.color.linear();
                ([r, g, b, 1.0], [fog.near, fog.far, 0.0, 0.0])
            }
            None => ([0.0; 4], [0.0, 1.0, 0.0, 0.0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_linear_and_clamped() {
        let fog = Fog::new(Color::from_hex(0x5500af), 0.0, 70.0);
        assert_eq!(fog.factor(-5.0), 0.0);
        assert_eq!(fog.factor(0.0), 0.0);
        assert!((fog.factor(35.0) - 0.5).abs() < 1e-6);
        assert_eq!(fog.factor(70.0), 1.0);
        assert_eq!(fog.factor(500.0), 1.0);
    }

    #[test]
    fn disabled_fog_packs_zero_flag() {
        let (color, _) = Fog::uniform(None);
        assert_eq!(color[3], 0.0);
        let fog = Fog::new(Color::WHITE, 1.0, 2.0);
        let (color, range) = Fog::uniform(Some(&fog));
        assert_eq!(color[3], 1.0);
        assert_eq!(range[..2], [1.0, 2.0]);
    }
}
