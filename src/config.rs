//! Scene configuration loaded from TOML.
//!
//! Every section has defaults matching the stock scene, so an empty file (or
//! no file at all) reproduces it exactly:
//!
//! ```toml
//! [window]
//! title = "Stellar"
//! width = 1280
//! height = 720
//!
//! [particles]
//! count = 10000
//! spread = 200.0
//!
//! [options]
//! sphere_color = "#ffea00"
//! speed = 0.005
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::draw2d::Color;
use crate::error::{Error, Result};
use crate::options::SceneOptions;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stellar.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub fog: FogConfig,
    pub particles: ParticleConfig,
    pub background: BackgroundConfig,
    pub helpers: HelperConfig,
    pub ui: UiConfig,
    pub options: SceneOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Stellar".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [-10.0, 30.0, 30.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FogConfig {
    pub enabled: bool,
    pub color: String,
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: "#5500af".to_string(),
            near: 0.0,
            far: 70.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleConfig {
    pub count: u32,
    /// Edge length of the cube the particles are scattered in.
    pub spread: f32,
    /// World-space point size.
    pub size: f32,
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            spread: 200.0,
            size: 0.05,
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Image shown behind the scene. Falls back to a generated starfield.
    pub image: Option<PathBuf>,
    /// Stars per million pixels in the generated starfield.
    pub star_density: f32,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            image: None,
            star_density: 900.0,
            width: 2048,
            height: 1024,
            seed: 7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HelperConfig {
    pub axes: bool,
    pub axes_size: f32,
    pub grid: bool,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub spot_light: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            axes: true,
            axes_size: 5.0,
            grid: true,
            grid_size: 30.0,
            grid_divisions: 10,
            spot_light: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// TTF/OTF font for the panel and modal. System fonts are tried when unset.
    pub font: Option<PathBuf>,
    pub font_size: f32,
    pub modal_title: String,
    pub modal_lines: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 14.0,
            modal_title: "Torus Knot".to_string(),
            modal_lines: vec![
                "A (2, 3) knot swept by a tube.".to_string(),
                "Move away to dismiss.".to_string(),
            ],
        }
    }
}

impl SceneConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// `origin` is only used in error messages.
    pub fn from_toml_str(text: &str, origin: impl AsRef<Path>) -> Result<Self> {
        let origin = origin.as_ref();
        let config: SceneConfig =
            toml::from_str(text).map_err(|e| Error::config(origin, e.to_string()))?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` if given, otherwise `stellar.toml` when it exists, otherwise defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    log::info!("loading configuration from {}", default.display());
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let fail = |message: String| Err(Error::config(origin, message));

        if self.window.width == 0 || self.window.height == 0 {
            return fail("window size must be non-zero".into());
        }
        let cam = &self.camera;
        if !(cam.fov > 0.0 && cam.fov < 180.0) {
            return fail(format!("camera.fov {} must be in (0, 180)", cam.fov));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return fail("camera planes must satisfy 0 < near < far".into());
        }
        if Color::from_hex_str(&self.fog.color).is_none() {
            return fail(format!("fog.color {:?} is not a hex color", self.fog.color));
        }
        if self.fog.far <= self.fog.near {
            return fail("fog.far must be greater than fog.near".into());
        }
        if !(self.particles.spread > 0.0 && self.particles.size > 0.0) {
            return fail("particles.spread and particles.size must be positive".into());
        }
        if self.background.width == 0 || self.background.height == 0 {
            return fail("background size must be non-zero".into());
        }
        if self.background.star_density < 0.0 {
            return fail("background.star_density must not be negative".into());
        }
        if self.helpers.grid_divisions == 0 {
            return fail("helpers.grid_divisions must be at least 1".into());
        }
        if self.ui.font_size <= 0.0 {
            return fail("ui.font_size must be positive".into());
        }
        self.options
            .validate()
            .or_else(|message| fail(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = SceneConfig::from_toml_str("", "test.toml").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.particles.count, 10_000);
        assert_eq!(config.camera.position, [-10.0, 30.0, 30.0]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [window]
            width = 800

            [options]
            speed = 0.02
        "#;
        let config = SceneConfig::from_toml_str(text, "test.toml").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.options.speed, 0.02);
        assert_eq!(config.options.intensity, 10.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SceneConfig::from_toml_str("[window]\ncolour = 1\n", "bad.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(SceneConfig::from_toml_str("[fog]\ncolor = \"purple\"\n", "x").is_err());
        assert!(SceneConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0\n", "x").is_err());
        assert!(SceneConfig::from_toml_str("[options]\nspeed = 0.5\n", "x").is_err());
        assert!(SceneConfig::from_toml_str("[helpers]\ngrid_divisions = 0\n", "x").is_err());
    }

    #[test]
    fn dumped_config_parses_back() {
        let mut config = SceneConfig::default();
        config.particles.count = 42;
        config.background.image = Some(PathBuf::from("stars.jpeg"));
        let text = config.to_toml_string().unwrap();
        let parsed = SceneConfig::from_toml_str(&text, "dump.toml").unwrap();
        assert_eq!(parsed, config);
    }
}
