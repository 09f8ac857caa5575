//! Starfield backdrop.
//!
//! The background is an image stretched over the whole window behind the
//! scene. It comes from a file when one is configured and readable;
//! otherwise a starfield is generated.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::BackgroundConfig;
use crate::gpu::GpuContext;
use crate::scene_pass::{fullscreen_pipeline, texture_sampler_layout};
use crate::texture::{self, Texture};

/// A generated night sky.
pub struct Starfield;

impl Starfield {
    /// Scatter `density` stars per million pixels over a near-black sky.
    ///
    /// Most stars are a single dim pixel; a few are brighter, slightly tinted
    /// and get a soft cross-shaped halo. Output is deterministic in `seed`.
    pub fn generate(width: u32, height: u32, seed: u64, density: f32) -> RgbaImage {
        let (width, height) = (width.max(1), height.max(1));
        let mut image = RgbaImage::from_pixel(width, height, Rgba([2, 1, 8, 255]));
        let mut rng = StdRng::seed_from_u64(seed);

        let pixels = width as f64 * height as f64;
        let count = (pixels * density.max(0.0) as f64 / 1_000_000.0).round() as u64;

        for _ in 0..count {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            // Squaring skews the distribution towards faint stars.
            let brightness = rng.r#gen::<f32>().powi(2);
            let level = 60.0 + brightness * 195.0;
            let tint = rng.gen_range(-0.15f32..0.15);
            let color = [
                (level * (1.0 + tint)).min(255.0),
                level,
                (level * (1.0 - tint)).min(255.0),
            ];
            add_light(&mut image, x as i64, y as i64, color, 1.0);

            if brightness > 0.6 {
                for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    add_light(&mut image, x as i64 + dx, y as i64 + dy, color, 0.35);
                }
            }
        }
        image
    }
}

fn add_light(image: &mut RgbaImage, x: i64, y: i64, color: [f32; 3], weight: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, value) in pixel.0.iter_mut().zip(color) {
        *channel = (*channel as f32 + value * weight).min(255.0) as u8;
    }
}

/// Where the background image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundSource {
    File(PathBuf),
    Procedural {
        width: u32,
        height: u32,
        seed: u64,
        density: f32,
    },
}

impl BackgroundSource {
    pub fn from_config(config: &BackgroundConfig) -> Self {
        match &config.image {
            Some(path) => Self::File(path.clone()),
            None => Self::procedural(config),
        }
    }

    fn procedural(config: &BackgroundConfig) -> Self {
        Self::Procedural {
            width: config.width,
            height: config.height,
            seed: config.seed,
            density: config.star_density,
        }
    }

    /// Produce the image, falling back to the configured starfield when the
    /// file cannot be read or decoded.
    pub fn load(&self, config: &BackgroundConfig) -> RgbaImage {
        match self {
            Self::File(path) => match texture::load_rgba(path) {
                Ok(image) => {
                    log::info!("background image {}", path.display());
                    image
                }
                Err(e) => {
                    log::warn!("{e}; using a generated starfield instead");
                    Self::procedural(config).load(config)
                }
            },
            Self::Procedural {
                width,
                height,
                seed,
                density,
            } => {
                log::info!("generating {width}x{height} starfield (seed {seed})");
                Starfield::generate(*width, *height, *seed, *density)
            }
        }
    }
}

/// Draws a background texture over the whole target.
pub struct BackgroundPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    pub texture: Texture,
}

impl BackgroundPass {
    pub fn new(gpu: &GpuContext, image: &RgbaImage, target_format: wgpu::TextureFormat) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = texture_sampler_layout(device, "Background Bind Group Layout");
        let texture = Texture::from_image(gpu, image, "Background Texture");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Background Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = fullscreen_pipeline(
            device,
            "Background Pipeline",
            &layout,
            &shader,
            "fs",
            target_format,
        );

        Self {
            pipeline,
            bind_group,
            texture,
        }
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| p.0[1] > 8).count()
    }

    #[test]
    fn starfield_is_deterministic() {
        let a = Starfield::generate(256, 128, 3, 2000.0);
        let b = Starfield::generate(256, 128, 3, 2000.0);
        assert_eq!(a, b);
        assert_ne!(a, Starfield::generate(256, 128, 4, 2000.0));
    }

    #[test]
    fn density_controls_star_count() {
        let empty = Starfield::generate(256, 256, 1, 0.0);
        assert_eq!(lit_pixels(&empty), 0);

        let sparse = lit_pixels(&Starfield::generate(256, 256, 1, 500.0));
        let dense = lit_pixels(&Starfield::generate(256, 256, 1, 5000.0));
        assert!(sparse > 0);
        assert!(dense > sparse * 4);
    }

    #[test]
    fn image_is_opaque() {
        let image = Starfield::generate(64, 64, 9, 10_000.0);
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn missing_file_falls_back_to_starfield() {
        let config = BackgroundConfig {
            image: Some(PathBuf::from("/nonexistent/stars.jpeg")),
            width: 32,
            height: 16,
            ..BackgroundConfig::default()
        };
        let source = BackgroundSource::from_config(&config);
        assert!(matches!(source, BackgroundSource::File(_)));
        let image = source.load(&config);
        assert_eq!(image.dimensions(), (32, 16));
    }
}
