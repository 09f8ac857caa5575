use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::animation::FrameClock;
use crate::assets::{Assets, FontId};
use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::draw2d::Draw2d;
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::render_graph::{FrameOutcome, RenderGraph};

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub assets: &'a mut Assets,
    pub config: &'a SceneConfig,
    font: &'a mut Option<FontId>,
    graph: &'a mut Option<RenderGraph>,
}

impl SetupContext<'_> {
    /// Load the configured UI font, falling back to system fonts.
    ///
    /// The result is also available to every frame as [`Frame::font`].
    pub fn ui_font(&mut self) -> Option<FontId> {
        if self.font.is_none() {
            let ui = &self.config.ui;
            *self.font = self
                .assets
                .load_ui_font(self.gpu, ui.font.as_deref(), ui.font_size);
        }
        *self.font
    }

    /// Use `graph` to render every frame. Without one only the overlay is drawn.
    pub fn render_graph(&mut self, graph: RenderGraph) {
        *self.graph = Some(graph);
    }
}

/// Context provided each frame.
///
/// The 2D overlay drawn through `draw` is composited over the render graph's
/// output after the frame closure returns.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub assets: &'a Assets,
    pub draw: &'a mut Draw2d,
    /// Camera the render graph uses for this frame.
    pub camera: &'a mut Camera,
    pub input: &'a Input,
    /// Visible seconds since start; stops while the window is hidden.
    pub time: f32,
    /// Seconds since the last frame.
    pub dt: f32,
    pub font: Option<FontId>,
}

impl Frame<'_> {
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    /// Screen width in pixels.
    pub fn width(&self) -> u32 {
        self.gpu.width()
    }

    /// Screen height in pixels.
    pub fn height(&self) -> u32 {
        self.gpu.height()
    }
}

/// Open a window and run until it is closed or Escape is pressed.
///
/// `setup` runs once the GPU is ready; it builds the scene and returns the
/// closure called every frame.
///
/// # Example
/// ```ignore
/// stellar::run(SceneConfig::default(), |ctx| {
///     let font = ctx.ui_font();
///     Ok(move |frame: &mut Frame<'_>| {
///         if let Some(font) = font {
///             let fps = format!("{:.0} fps", frame.fps());
///             frame.draw.text(frame.assets, font, 10.0, 10.0, &fps, Color::WHITE);
///         }
///     })
/// })
/// ```
pub fn run<S, F>(config: SceneConfig, setup: S) -> Result<()>
where
    S: FnOnce(&mut SetupContext) -> Result<F> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = StellarApp::Pending {
        config,
        setup: Some(Box::new(move |ctx: &mut SetupContext| {
            let frame_fn = setup(ctx)?;
            Ok(Box::new(frame_fn) as Box<dyn FnMut(&mut Frame)>)
        })),
    };

    event_loop.run_app(&mut app)?;

    match app {
        StellarApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<Box<dyn FnMut(&mut Frame)>>>;

enum StellarApp {
    Pending {
        config: SceneConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    /// Setup or rendering failed; the loop is exiting with this error.
    Failed(Error),
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    assets: Assets,
    draw_2d: Draw2d,
    camera: Camera,
    input: Input,
    frame_fn: Box<dyn FnMut(&mut Frame)>,
    font: Option<FontId>,
    render_graph: Option<RenderGraph>,
    clock: FrameClock,
}

impl StellarApp {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &SceneConfig,
        setup: SetupFn,
    ) -> Result<Running> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window.width,
                config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let mut assets = Assets::new();
        let draw_2d = Draw2d::new(&gpu);

        let mut font = None;
        let mut render_graph = None;
        let frame_fn = setup(&mut SetupContext {
            gpu: &gpu,
            assets: &mut assets,
            config,
            font: &mut font,
            graph: &mut render_graph,
        })?;

        log::info!(
            "window ready at {}x{}",
            gpu.width(),
            gpu.height()
        );

        Ok(Running {
            window,
            gpu,
            assets,
            draw_2d,
            camera: Camera::new(),
            input: Input::new(),
            frame_fn,
            font,
            render_graph,
            clock: FrameClock::new(),
        })
    }
}

impl ApplicationHandler for StellarApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let StellarApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        *self = match Self::start(event_loop, config, setup) {
            Ok(running) => {
                running.window.request_redraw();
                StellarApp::Running(Box::new(running))
            }
            Err(e) => {
                event_loop.exit();
                StellarApp::Failed(e)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let StellarApp::Running(app) = self else {
            return;
        };
        let Running {
            window,
            gpu,
            assets,
            draw_2d,
            camera,
            input,
            frame_fn,
            font,
            render_graph,
            clock,
        } = app.as_mut();

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Graph targets and depth buffers follow on the next frame.
                log::debug!("resized to {}x{}", size.width, size.height);
                gpu.resize(size.width, size.height);
                clock.set_paused(size.width == 0 || size.height == 0);
                window.request_redraw();
            }
            WindowEvent::Occluded(occluded) => {
                clock.set_paused(occluded);
                if !occluded {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if clock.is_paused() {
                    input.begin_frame();
                    return;
                }

                let dt = clock.tick(Instant::now());

                draw_2d.clear();
                draw_2d.update_font_bind_groups(gpu, assets);

                let mut frame = Frame {
                    gpu,
                    assets,
                    draw: &mut *draw_2d,
                    camera: &mut *camera,
                    input,
                    time: clock.elapsed(),
                    dt,
                    font: *font,
                };

                frame_fn(&mut frame);

                let outcome = match render_graph {
                    Some(graph) => graph.execute_with_ui(gpu, clock.elapsed(), camera, |gpu, pass| {
                        draw_2d.render(gpu, pass);
                    }),
                    None => render_2d_only(gpu, draw_2d),
                };
                if outcome == FrameOutcome::OutOfMemory {
                    log::error!("GPU out of memory, exiting");
                    event_loop.exit();
                    return;
                }

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Render only the 2D overlay when no render graph is configured.
fn render_2d_only(gpu: &GpuContext, draw_2d: &Draw2d) -> FrameOutcome {
    let output = match gpu.surface.get_current_texture() {
        Ok(output) => output,
        Err(wgpu::SurfaceError::OutOfMemory) => return FrameOutcome::OutOfMemory,
        Err(e) => {
            log::debug!("skipping overlay frame: {e}");
            gpu.reconfigure();
            return FrameOutcome::Skipped;
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("2D Only Encoder"),
        });

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("2D Only Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        draw_2d.render(gpu, &mut render_pass);
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    FrameOutcome::Presented
}
