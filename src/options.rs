//! The live-tweakable option set bound to the parameter panel.

use serde::{Deserialize, Serialize};

use crate::draw2d::Color;

/// Values shown in the parameter panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneOptions {
    pub sphere_color: String,
    pub wireframe: bool,
    pub speed: f32,
    pub angle: f32,
    pub penumbra: f32,
    pub intensity: f32,
    pub bloom_threshold: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            sphere_color: "#ffea00".to_string(),
            wireframe: false,
            speed: 0.005,
            angle: 0.2,
            penumbra: 0.0,
            intensity: 10.0,
            bloom_threshold: 0.85,
            bloom_strength: 1.5,
            bloom_radius: 0.4,
        }
    }
}

/// Identifies one numeric option and carries its panel range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericOption {
    Speed,
    Angle,
    Penumbra,
    Intensity,
    BloomThreshold,
    BloomStrength,
    BloomRadius,
}

impl NumericOption {
    pub const ALL: [NumericOption; 7] = [
        NumericOption::Speed,
        NumericOption::Angle,
        NumericOption::Penumbra,
        NumericOption::Intensity,
        NumericOption::BloomThreshold,
        NumericOption::BloomStrength,
        NumericOption::BloomRadius,
    ];

    /// Inclusive slider range.
    pub fn range(self) -> (f32, f32) {
        match self {
            NumericOption::Speed => (0.0, 0.1),
            NumericOption::Angle => (0.0, 1.0),
            NumericOption::Penumbra => (0.0, 1.0),
            NumericOption::Intensity => (0.0, 20.0),
            NumericOption::BloomThreshold => (0.0, 1.0),
            NumericOption::BloomStrength => (0.0, 3.0),
            NumericOption::BloomRadius => (0.0, 1.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericOption::Speed => "speed",
            NumericOption::Angle => "angle",
            NumericOption::Penumbra => "penumbra",
            NumericOption::Intensity => "intensity",
            NumericOption::BloomThreshold => "bloomThreshold",
            NumericOption::BloomStrength => "bloomStrength",
            NumericOption::BloomRadius => "bloomRadius",
        }
    }

    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        if value.is_nan() {
            min
        } else {
            value.clamp(min, max)
        }
    }
}

/// A single edit made through the panel.
///
/// The scene applies these to the live objects they are bound to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptionChange {
    SphereColor(Color),
    Wireframe(bool),
    Numeric(NumericOption, f32),
}

impl SceneOptions {
    pub fn get(&self, option: NumericOption) -> f32 {
        match option {
            NumericOption::Speed => self.speed,
            NumericOption::Angle => self.angle,
            NumericOption::Penumbra => self.penumbra,
            NumericOption::Intensity => self.intensity,
            NumericOption::BloomThreshold => self.bloom_threshold,
            NumericOption::BloomStrength => self.bloom_strength,
            NumericOption::BloomRadius => self.bloom_radius,
        }
    }

    /// Store a numeric value, clamped to the option's range. Returns the stored value.
    pub fn set(&mut self, option: NumericOption, value: f32) -> f32 {
        let value = option.clamp(value);
        let slot = match option {
            NumericOption::Speed => &mut self.speed,
            NumericOption::Angle => &mut self.angle,
            NumericOption::Penumbra => &mut self.penumbra,
            NumericOption::Intensity => &mut self.intensity,
            NumericOption::BloomThreshold => &mut self.bloom_threshold,
            NumericOption::BloomStrength => &mut self.bloom_strength,
            NumericOption::BloomRadius => &mut self.bloom_radius,
        };
        *slot = value;
        value
    }

    /// Record a change so the option set mirrors what the panel shows.
    pub fn record(&mut self, change: OptionChange) {
        match change {
            OptionChange::SphereColor(color) => self.sphere_color = color.to_hex_string(),
            OptionChange::Wireframe(on) => self.wireframe = on,
            OptionChange::Numeric(option, value) => {
                self.set(option, value);
            }
        }
    }

    pub fn sphere_color(&self) -> Color {
        Color::from_hex_str(&self.sphere_color).unwrap_or(Color::WHITE)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if Color::from_hex_str(&self.sphere_color).is_none() {
            return Err(format!(
                "options.sphere_color {:?} is not a hex color",
                self.sphere_color
            ));
        }
        for option in NumericOption::ALL {
            let value = self.get(option);
            let (min, max) = option.range();
            if !(min..=max).contains(&value) {
                return Err(format!(
                    "options.{} = {} is outside {}..={}",
                    option.label(),
                    value,
                    min,
                    max
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_panel() {
        let options = SceneOptions::default();
        assert_eq!(options.sphere_color, "#ffea00");
        assert!(!options.wireframe);
        assert_eq!(options.get(NumericOption::Speed), 0.005);
        assert_eq!(options.get(NumericOption::BloomStrength), 1.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn set_clamps_to_range() {
        let mut options = SceneOptions::default();
        assert_eq!(options.set(NumericOption::Intensity, 35.0), 20.0);
        assert_eq!(options.set(NumericOption::Speed, -1.0), 0.0);
        assert_eq!(options.set(NumericOption::BloomRadius, f32::NAN), 0.0);
        assert_eq!(options.intensity, 20.0);
    }

    #[test]
    fn record_tracks_color_as_hex() {
        let mut options = SceneOptions::default();
        options.record(OptionChange::SphereColor(Color::from_hex(0x00ff00)));
        assert_eq!(options.sphere_color, "#00ff00");
        options.record(OptionChange::Wireframe(true));
        assert!(options.wireframe);
    }
}
