use crate::assets::{Assets, FontId};
use crate::gpu::GpuContext;

/// A rectangle in screen-space pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// RGBA color in display (sRGB) space.
///
/// Hex values parse as-is; use [`Color::linear`] when handing the color to a
/// shader that writes to an sRGB target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

    /// Panel borders and separators.
    pub const PANEL_BORDER: Color = Color::rgba(0.25, 0.25, 0.25, 1.0);

    /// Color from a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Parse `#rrggbb`, `rrggbb` or `#rgb`.
    pub fn from_hex_str(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_hex),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16).ok().map(Self::from_hex)
            }
            _ => None,
        }
    }

    /// `#rrggbb`, alpha ignored.
    pub fn to_hex_string(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Linear-light RGBA for shaders, alpha untouched.
    pub fn linear(&self) -> [f32; 4] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a,
        ]
    }

    /// Build from hue (degrees), saturation and value in `[0, 1]`.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::rgb(r + m, g + m, b + m)
    }

    /// Hue in degrees, saturation and value.
    pub fn to_hsv(&self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;
        let hue = if delta <= f32::EPSILON {
            0.0
        } else if max == self.r {
            60.0 * ((self.g - self.b) / delta).rem_euclid(6.0)
        } else if max == self.g {
            60.0 * ((self.b - self.r) / delta + 2.0)
        } else {
            60.0 * ((self.r - self.g) / delta + 4.0)
        };
        let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
        (hue, saturation, max)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Overlay vertex in pixel coordinates.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Uniforms for 2D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 32768;

/// Immediate-mode 2D drawing API for panels, cards and text.
///
/// Calls are recorded during the frame and flushed in one pass over the
/// finished scene: quads first, then each font's glyphs.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    textured_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,

    // Indexed by FontId.
    font_bind_groups: Vec<Option<wgpu::BindGroup>>,

    colored_vertices: Vec<Vertex2d>,
    text_batches: Vec<(FontId, Vec<Vertex2d>)>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Uniform bind group layout (group 0)
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Texture bind group layout (group 1)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let colored_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Colored Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let textured_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Draw2d Textured Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blend_state = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let make_pipeline = |label: &str, layout: &wgpu::PipelineLayout, fragment: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex2d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend_state),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let colored_pipeline = make_pipeline(
            "Draw2d Colored Pipeline",
            &colored_pipeline_layout,
            "fs_colored",
        );
        let textured_pipeline = make_pipeline(
            "Draw2d Textured Pipeline",
            &textured_pipeline_layout,
            "fs_textured",
        );

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            colored_pipeline,
            textured_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            font_bind_groups: Vec::new(),
            colored_vertices: Vec::with_capacity(1024),
            text_batches: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.colored_vertices.clear();
        self.text_batches.clear();
    }

    /// Draw a filled rectangle.
    pub fn rect(&mut self, rect: Rect, color: Color) {
        let c = color.linear();
        let uv = [0.0, 0.0];
        let (x0, y0, x1, y1) = (rect.x, rect.y, rect.right(), rect.bottom());

        self.colored_vertices.extend_from_slice(&[
            Vertex2d { position: [x0, y0], uv, color: c },
            Vertex2d { position: [x1, y0], uv, color: c },
            Vertex2d { position: [x0, y1], uv, color: c },
            Vertex2d { position: [x1, y0], uv, color: c },
            Vertex2d { position: [x1, y1], uv, color: c },
            Vertex2d { position: [x0, y1], uv, color: c },
        ]);
    }

    /// Draw a rectangle outline of the given thickness.
    pub fn outline(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness;
        self.rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.rect(Rect::new(rect.x, rect.y, t, rect.height), color);
        self.rect(Rect::new(rect.right() - t, rect.y, t, rect.height), color);
    }

    /// Draw text with its top-left corner at `(x, y)`.
    pub fn text(
        &mut self,
        assets: &Assets,
        font_id: FontId,
        x: f32,
        y: f32,
        text: &str,
        color: Color,
    ) {
        let Some(font) = assets.font(font_id) else {
            return;
        };

        let c = color.linear();
        let mut cursor_x = x;
        let baseline_y = y + font.size();

        let batch_idx = self
            .text_batches
            .iter()
            .position(|(id, _)| *id == font_id)
            .unwrap_or_else(|| {
                self.text_batches.push((font_id, Vec::new()));
                self.text_batches.len() - 1
            });

        for ch in text.chars() {
            let Some(glyph) = font.glyph(ch) else {
                cursor_x += font.size() * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let gx = cursor_x + glyph.offset_x;
                // fontdue's ymin is measured from the baseline to the glyph bottom
                let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                let gw = glyph.width as f32;
                let gh = glyph.height as f32;

                let u0 = glyph.uv[0];
                let v0 = glyph.uv[1];
                let u1 = u0 + glyph.uv[2];
                let v1 = v0 + glyph.uv[3];

                self.text_batches[batch_idx].1.extend_from_slice(&[
                    Vertex2d { position: [gx, gy], uv: [u0, v0], color: c },
                    Vertex2d { position: [gx + gw, gy], uv: [u1, v0], color: c },
                    Vertex2d { position: [gx, gy + gh], uv: [u0, v1], color: c },
                    Vertex2d { position: [gx + gw, gy], uv: [u1, v0], color: c },
                    Vertex2d { position: [gx + gw, gy + gh], uv: [u1, v1], color: c },
                    Vertex2d { position: [gx, gy + gh], uv: [u0, v1], color: c },
                ]);
            }

            cursor_x += glyph.advance;
        }
    }

    /// Create bind groups for fonts loaded since the last call.
    pub(crate) fn update_font_bind_groups(&mut self, gpu: &GpuContext, assets: &Assets) {
        while self.font_bind_groups.len() < assets.fonts.len() {
            self.font_bind_groups.push(None);
        }

        for (i, font) in assets.fonts.iter().enumerate() {
            if self.font_bind_groups[i].is_none() {
                let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Font Bind Group"),
                    layout: &self.texture_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&font.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&font.sampler),
                        },
                    ],
                });
                self.font_bind_groups[i] = Some(bind_group);
            }
        }
    }

    /// Upload and draw everything recorded since [`clear`](Self::clear).
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        let uniforms = Draw2dUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let colored = &self.colored_vertices[..self.colored_vertices.len().min(MAX_VERTICES)];
        if !colored.is_empty() {
            gpu.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(colored));

            render_pass.set_pipeline(&self.colored_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..colored.len() as u32, 0..1);
        }

        let mut offset = colored.len();
        for (font_id, vertices) in &self.text_batches {
            let room = MAX_VERTICES - offset;
            let vertices = &vertices[..vertices.len().min(room)];
            if vertices.is_empty() {
                continue;
            }

            let Some(bind_group) = self
                .font_bind_groups
                .get(font_id.0)
                .and_then(|bg| bg.as_ref())
            else {
                continue;
            };

            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (offset * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(vertices),
            );

            render_pass.set_pipeline(&self.textured_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(offset as u32..(offset + vertices.len()) as u32, 0..1);

            offset += vertices.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Color::from_hex_str("#ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex_str("0000ff"), Some(Color::BLUE));
        assert_eq!(Color::from_hex_str("#0f0"), Some(Color::GREEN));
        assert_eq!(Color::from_hex_str("#ffea00").unwrap().to_hex_string(), "#ffea00");
        assert!(Color::from_hex_str("#ggg000").is_none());
        assert!(Color::from_hex_str("#12345").is_none());
    }

    #[test]
    fn linear_conversion_endpoints() {
        let [r, g, b, a] = Color::rgba(0.0, 1.0, 0.5, 0.25).linear();
        assert_eq!(r, 0.0);
        assert!((g - 1.0).abs() < 1e-6);
        assert!((b - 0.214).abs() < 1e-3);
        assert_eq!(a, 0.25);
    }

    #[test]
    fn hsv_round_trip() {
        for hex in [0xffea00, 0x0000ff, 0x5500af, 0x333333, 0xff0000] {
            let color = Color::from_hex(hex);
            let (h, s, v) = color.to_hsv();
            let back = Color::from_hsv(h, s, v);
            assert_eq!(back.to_hex_string(), color.to_hex_string());
        }
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(14.9, 14.9));
        assert!(!rect.contains(15.0, 12.0));
        assert!(!rect.contains(9.9, 12.0));
    }
}
