use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use nabu_engine::render::frame_len;
use nabu_engine::{ContextConfig, GraphicsContext, UniformLocation};

use crate::snapshot;
use crate::source::ShaderSources;
use crate::surface::{self, SurfaceErrorAction};

/// Uniform advanced every frame, in seconds since startup.
const TIME_UNIFORM: &str = "time";

/// Compiles `sources`, opens a window and shows the program until closed.
pub fn run(sources: ShaderSources) -> Result<()> {
    let mut ctx = GraphicsContext::initialize(ContextConfig::default())
        .context("failed to initialize graphics context")?;

    let build = sources.compile(&mut ctx);
    if build.has_log() {
        log::warn!("shader log:\n{}", build.log);
    }
    anyhow::ensure!(build.linked, "{} failed to link", build.id);
    ctx.select_program(build.id)?;

    let time = ctx.locate_uniform(build.id, TIME_UNIFORM);
    if !time.is_found() {
        log::info!("program has no `{TIME_UNIFORM}` uniform; output will be static");
    }

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = Preview::new(ctx, time);

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    match state.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[self_referencing]
struct Presenter {
    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: wgpu::Surface<'this>,
}

struct Preview {
    ctx: GraphicsContext,
    time: UniformLocation,
    started: Instant,

    presenter: Option<Presenter>,
    surface_config: Option<wgpu::SurfaceConfiguration>,

    /// Last readback and its size.
    pixels: Vec<u8>,
    frame_size: (u32, u32),

    error: Option<anyhow::Error>,
}

impl Preview {
    fn new(ctx: GraphicsContext, time: UniformLocation) -> Self {
        Self {
            ctx,
            time,
            started: Instant::now(),
            presenter: None,
            surface_config: None,
            pixels: Vec::new(),
            frame_size: (0, 0),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_presenter(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("nabu preview")
            .with_inner_size(LogicalSize::new(960.0, 540.0));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let instance = self.ctx.instance();
        let presenter = PresenterTryBuilder {
            window,
            surface_builder: |w| instance.create_surface(w),
        }
        .try_build()
        .context("failed to create wgpu surface")?;

        let size = presenter.borrow_window().inner_size();
        let caps = presenter
            .borrow_surface()
            .get_capabilities(self.ctx.adapter());
        let config = surface::configuration(&caps, size)?;
        presenter.borrow_surface().configure(self.ctx.device(), &config);

        self.presenter = Some(presenter);
        self.surface_config = Some(config);
        Ok(())
    }

    fn resize(&mut self) {
        let (Some(presenter), Some(config)) = (&self.presenter, &mut self.surface_config) else {
            return;
        };

        let new_size = presenter.borrow_window().inner_size();
        surface::apply_resize(presenter.borrow_surface(), self.ctx.device(), config, new_size);
        presenter.borrow_window().request_redraw();
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(presenter), Some(config)) = (&self.presenter, &self.surface_config) else {
            return Ok(());
        };

        // Frames larger than the context's surface bound are cropped.
        let (max_width, max_height) = self.ctx.max_size();
        let width = config.width.min(max_width);
        let height = config.height.min(max_height);

        self.ctx
            .set_uniform_float(self.time, self.started.elapsed().as_secs_f32())?;

        self.pixels.resize(frame_len(width, height), 0);
        self.ctx.render_frame(width, height, &mut self.pixels)?;
        self.frame_size = (width, height);

        let surface = presenter.borrow_surface();
        let target = match surface.get_current_texture() {
            Ok(target) => target,
            Err(err) => {
                let action =
                    surface::map_surface_error(surface, self.ctx.device(), config, err.clone());
                log::debug!("surface acquire failed ({err}), {action:?}");
                return match action {
                    SurfaceErrorAction::Fatal => Err(err).context("failed to acquire surface texture"),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                };
            }
        };

        let mut encoder = self
            .ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("nabu preview present"),
            });

        encoder.copy_texture_to_texture(
            self.ctx.color_texture().as_image_copy(),
            target.texture.as_image_copy(),
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.ctx.queue().submit(std::iter::once(encoder.finish()));
        presenter.borrow_window().pre_present_notify();
        target.present();
        Ok(())
    }

    fn save_snapshot(&self) -> Result<()> {
        let (width, height) = self.frame_size;
        anyhow::ensure!(width > 0 && height > 0, "no frame rendered yet");
        snapshot::save_png(&snapshot::default_path(), width, height, &self.pixels)
    }
}

impl ApplicationHandler for Preview {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_some() {
            return;
        }

        if let Err(err) = self.create_presenter(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw keeps `time` moving.
        if let Some(presenter) = &self.presenter {
            presenter.borrow_window().request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyS => {
                    if let Err(err) = self.save_snapshot() {
                        log::error!("snapshot failed: {err:#}");
                    }
                }
                _ => {}
            },

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),

            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }

            _ => {}
        }
    }
}
