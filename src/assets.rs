use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Index of a font loaded into [`Assets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontId(pub(crate) usize);

/// Where a glyph sits in the atlas and how it is placed on a baseline.
#[derive(Clone, Copy, Debug)]
pub struct GlyphInfo {
    /// Normalized `[x, y, w, h]`.
    pub uv: [f32; 4],
    pub width: u32,
    pub height: u32,
    /// Bitmap corner relative to the pen, y up from the baseline.
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance: f32,
}

/// Fonts tried, in order, when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const ATLAS_PADDING: u32 = 1;

/// Row-pack glyph rectangles into a `width × height` atlas.
///
/// Returns the top-left corner of each rectangle, or `None` if they don't fit.
fn pack_rows(sizes: &[(u32, u32)], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut placements = Vec::with_capacity(sizes.len());
    let mut x = ATLAS_PADDING;
    let mut y = ATLAS_PADDING;
    let mut row_height = 0u32;

    for &(glyph_w, glyph_h) in sizes {
        if glyph_w + 2 * ATLAS_PADDING > width {
            return None;
        }
        if x + glyph_w + ATLAS_PADDING > width {
            x = ATLAS_PADDING;
            y += row_height + ATLAS_PADDING;
            row_height = 0;
        }
        if y + glyph_h + ATLAS_PADDING > height {
            return None;
        }
        placements.push((x, y));
        x += glyph_w + ATLAS_PADDING;
        row_height = row_height.max(glyph_h);
    }

    Some(placements)
}

/// One font rasterized at a fixed size into a single-channel texture.
pub struct FontAtlas {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    glyphs: HashMap<char, GlyphInfo>,
    size: f32,
    line_height: f32,
}

impl FontAtlas {
    /// Rasterize printable ASCII from TTF/OTF bytes, growing the atlas
    /// until every glyph fits. `origin` names the font in error messages.
    pub fn new(gpu: &GpuContext, font_data: &[u8], size: f32, origin: &Path) -> Result<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default()).map_err(|message| {
            Error::Font {
                path: origin.to_path_buf(),
                message: message.to_string(),
            }
        })?;

        // Printable ASCII plus the degree sign used by the panel
        let chars: Vec<char> = (32u8..=126u8).map(|c| c as char).chain(['°']).collect();

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = chars
            .iter()
            .map(|&c| {
                let (metrics, bitmap) = font.rasterize(c, size);
                (c, metrics, bitmap)
            })
            .collect();
        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();

        let mut atlas_width = 256u32;
        let mut atlas_height = 256u32;
        let placements = loop {
            if let Some(placements) = pack_rows(&sizes, atlas_width, atlas_height) {
                break placements;
            }
            if atlas_width >= 8192 && atlas_height >= 8192 {
                return Err(Error::Font {
                    path: origin.to_path_buf(),
                    message: format!("glyphs at size {size} do not fit an 8192² atlas"),
                });
            }
            if atlas_width <= atlas_height {
                atlas_width *= 2;
            } else {
                atlas_height *= 2;
            }
        };

        let mut atlas_data = vec![0u8; (atlas_width * atlas_height) as usize];
        let mut glyphs = HashMap::new();

        for ((c, metrics, bitmap), &(x, y)) in rasterized.iter().zip(&placements) {
            let glyph_w = metrics.width as u32;
            let glyph_h = metrics.height as u32;

            for gy in 0..glyph_h {
                let src = (gy * glyph_w) as usize;
                let dst = ((y + gy) * atlas_width + x) as usize;
                atlas_data[dst..dst + glyph_w as usize]
                    .copy_from_slice(&bitmap[src..src + glyph_w as usize]);
            }

            glyphs.insert(
                *c,
                GlyphInfo {
                    uv: [
                        x as f32 / atlas_width as f32,
                        y as f32 / atlas_height as f32,
                        glyph_w as f32 / atlas_width as f32,
                        glyph_h as f32 / atlas_height as f32,
                    ],
                    width: glyph_w,
                    height: glyph_h,
                    offset_x: metrics.xmin as f32,
                    offset_y: metrics.ymin as f32,
                    advance: metrics.advance_width,
                },
            );
        }

        let extent = wgpu::Extent3d {
            width: atlas_width,
            height: atlas_height,
            depth_or_array_layers: 1,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Font Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas_width),
                rows_per_image: Some(atlas_height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Font Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let line_height = font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2);

        Ok(Self {
            texture,
            view,
            sampler,
            glyphs,
            size,
            line_height,
        })
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&c)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Baseline-to-baseline distance.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Advance width of `text`; missing glyphs count as half an em.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.glyphs.get(&c).map_or(self.size * 0.5, |g| g.advance))
            .sum()
    }
}

/// Loaded fonts, addressed by [`FontId`].
#[derive(Default)]
pub struct Assets {
    pub(crate) fonts: Vec<Arc<FontAtlas>>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_font(
        &mut self,
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        size: f32,
    ) -> Result<FontId> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let atlas = FontAtlas::new(gpu, &data, size, path)?;
        let id = FontId(self.fonts.len());
        self.fonts.push(Arc::new(atlas));
        Ok(id)
    }

    /// Load the configured font, or the first system font that parses.
    ///
    /// Returns `None` when nothing is usable; text drawing is then skipped.
    pub fn load_ui_font(
        &mut self,
        gpu: &GpuContext,
        configured: Option<&Path>,
        size: f32,
    ) -> Option<FontId> {
        if let Some(path) = configured {
            match self.load_font(gpu, path, size) {
                Ok(id) => {
                    log::info!("using font {}", path.display());
                    return Some(id);
                }
                Err(e) => log::warn!("{e}; falling back to system fonts"),
            }
        }

        for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
            if !candidate.exists() {
                continue;
            }
            match self.load_font(gpu, &candidate, size) {
                Ok(id) => {
                    log::info!("using font {}", candidate.display());
                    return Some(id);
                }
                Err(e) => log::debug!("skipping {}: {e}", candidate.display()),
            }
        }

        log::warn!("no usable font found; panel and modal text will not be drawn (set ui.font)");
        None
    }

    pub fn font(&self, id: FontId) -> Option<Arc<FontAtlas>> {
        self.fonts.get(id.0).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_wraps_rows() {
        let sizes = [(10, 8), (10, 12), (10, 4)];
        let placed = pack_rows(&sizes, 24, 64).unwrap();
        assert_eq!(placed[0], (1, 1));
        assert_eq!(placed[1], (12, 1));
        // Third glyph wraps below the tallest glyph of the first row.
        assert_eq!(placed[2], (1, 14));
    }

    #[test]
    fn packing_reports_overflow() {
        assert!(pack_rows(&[(10, 10); 5], 24, 24).is_none());
        assert!(pack_rows(&[(40, 4)], 24, 24).is_none());
        assert_eq!(pack_rows(&[], 8, 8), Some(vec![]));
    }
}
