//! Surface parameters for lit meshes.

use crate::draw2d::Color;

/// The subset of a standard PBR material the scene uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base color in display space.
    pub color: Color,
    /// Draw triangle edges instead of filled faces.
    pub wireframe: bool,
    /// Light and render both faces.
    pub double_sided: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            wireframe: false,
            double_sided: false,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

impl Material {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Material from a `0xRRGGBB` literal.
    pub fn hex(hex: u32) -> Self {
        Self::new(Color::from_hex(hex))
    }

    pub fn wireframe(mut self, on: bool) -> Self {
        self.wireframe = on;
        self
    }

    pub fn double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    pub fn casts_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receives_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    /// Linear-light base color for the GPU.
    pub fn linear_color(&self) -> [f32; 4] {
        self.color.linear()
    }

    /// Bit flags packed into the per-draw uniform. Wireframe selects a
    /// pipeline instead.
    pub(crate) fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.receive_shadow {
            flags |= FLAG_RECEIVE_SHADOW;
        }
        if self.double_sided {
            flags |= FLAG_DOUBLE_SIDED;
        }
        flags
    }
}

pub(crate) const FLAG_RECEIVE_SHADOW: u32 = 1;
pub(crate) const FLAG_DOUBLE_SIDED: u32 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_flags() {
        let ground = Material::hex(0xffffff).double_sided().receives_shadow();
        assert_eq!(ground.flags(), FLAG_RECEIVE_SHADOW | FLAG_DOUBLE_SIDED);
        assert!(!ground.cast_shadow);

        let sphere = Material::hex(0x0000ff).casts_shadow().wireframe(true);
        assert_eq!(sphere.flags(), 0);
        assert!(sphere.wireframe);
        assert_eq!(sphere.color, Color::BLUE);
    }

    #[test]
    fn linear_color_converts_from_srgb() {
        let [r, g, b, a] = Material::hex(0x808080).linear_color();
        assert!((r - 0.2158).abs() < 1e-3);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 1.0);
    }
}
