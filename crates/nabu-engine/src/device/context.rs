use crate::error::{RenderError, Result};
use crate::program::{Program, ProgramArena, ProgramBuild, ProgramBuilder, ProgramId, RESOLUTION_UNIFORM};
use crate::render::{frame_len, FrameRenderer};
use crate::shader::ShaderLanguage;
use crate::uniform::{UniformLocation, UniformValue};

use super::{ContextConfig, Gpu, OffscreenSurface};

/// Off-screen rendering context.
///
/// Owns the GPU device, a hidden surface of `max_width x max_height` pixels,
/// every program compiled against it and the selected program. Dropping the
/// context (or calling [`GraphicsContext::shutdown`]) releases all of it.
///
/// The context is not thread-safe by contract: every call must come from the
/// thread that created it.
pub struct GraphicsContext {
    gpu: Gpu,
    surface: OffscreenSurface,
    frame: FrameRenderer,
    programs: ProgramArena,
    config: ContextConfig,
}

impl GraphicsContext {
    /// Creates the device and hidden surface, blocking until both exist.
    pub fn initialize(config: ContextConfig) -> Result<Self> {
        pollster::block_on(Self::new(config))
    }

    /// Async variant of [`Self::initialize`].
    pub async fn new(config: ContextConfig) -> Result<Self> {
        if config.max_width == 0 || config.max_height == 0 {
            return Err(RenderError::EmptySurface {
                width: config.max_width,
                height: config.max_height,
            });
        }

        let gpu = Gpu::new(&config).await?;
        let surface = OffscreenSurface::new(gpu.device(), config.max_width, config.max_height);
        let frame = FrameRenderer::new(gpu.device(), &surface);

        log::info!(
            "graphics context ready, surface {}x{}",
            config.max_width,
            config.max_height
        );

        Ok(Self {
            gpu,
            surface,
            frame,
            programs: ProgramArena::new(),
            config,
        })
    }

    /// Releases the surface, programs and device.
    pub fn shutdown(self) {
        log::info!("shutting down graphics context ({} programs)", self.programs.len());
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Surface bound; every frame must fit inside it.
    pub fn max_size(&self) -> (u32, u32) {
        self.surface.size()
    }

    pub fn instance(&self) -> &wgpu::Instance {
        self.gpu.instance()
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        self.gpu.adapter()
    }

    pub fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.gpu.queue()
    }

    /// Color texture of the hidden surface, holding the last rendered frame.
    pub fn color_texture(&self) -> &wgpu::Texture {
        self.surface.color_texture()
    }

    // ---- programs ------------------------------------------------------

    /// Compiles and links a GLSL vertex/fragment pair.
    pub fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> ProgramBuild {
        self.compile_program_with(ShaderLanguage::Glsl, vertex_source, fragment_source)
    }

    pub fn compile_program_with(
        &mut self,
        language: ShaderLanguage,
        vertex_source: &str,
        fragment_source: &str,
    ) -> ProgramBuild {
        let program = ProgramBuilder::new(self.gpu.device())
            .language(language)
            .build(vertex_source, fragment_source);
        self.register(program)
    }

    /// Links a GLSL fragment stage against the built-in vertex stage.
    pub fn compile_fragment_program(&mut self, fragment_source: &str) -> ProgramBuild {
        self.compile_fragment_program_with(ShaderLanguage::Glsl, fragment_source)
    }

    pub fn compile_fragment_program_with(
        &mut self,
        language: ShaderLanguage,
        fragment_source: &str,
    ) -> ProgramBuild {
        let program = ProgramBuilder::new(self.gpu.device())
            .language(language)
            .build_fragment(fragment_source);
        self.register(program)
    }

    fn register(&mut self, program: Program) -> ProgramBuild {
        let linked = program.is_linked();
        let log = program.log().to_owned();
        let id = self.programs.insert(program);

        if linked {
            log::debug!("{id} linked");
        } else {
            log::warn!("{id} is not linked");
        }

        ProgramBuild { id, linked, log }
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(id)
    }

    /// Uniform names of `id`, empty for unknown programs.
    pub fn uniform_names(&self, id: ProgramId) -> Vec<String> {
        self.programs
            .get(id)
            .map(|p| p.uniforms().names().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Makes `id` the program used by [`Self::render_frame`] and the target
    /// of uniform writes.
    pub fn select_program(&mut self, id: ProgramId) -> Result<()> {
        if self.programs.get(id).is_none() {
            return Err(RenderError::UnknownProgram(id));
        }
        self.frame.select(id);
        Ok(())
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.frame.active()
    }

    // ---- uniforms ------------------------------------------------------

    /// Resolves the uniform called `name` in program `id`.
    ///
    /// Returns [`UniformLocation::NOT_FOUND`] for unknown programs and names.
    pub fn locate_uniform(&self, id: ProgramId, name: &str) -> UniformLocation {
        self.programs
            .get(id)
            .and_then(|p| p.uniforms().locate(name))
            .map_or(UniformLocation::NOT_FOUND, |entry| UniformLocation::found(id, entry))
    }

    /// Writes `value` to `location` in the active program.
    ///
    /// Writes to [`UniformLocation::NOT_FOUND`] are ignored.
    pub fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) -> Result<()> {
        let Some((owner, entry)) = location.slot() else {
            return Ok(());
        };

        let active = self.frame.active().ok_or(RenderError::NoProgramSelected)?;
        if owner != active {
            return Err(RenderError::ForeignUniform {
                location: owner,
                active,
            });
        }

        let program = self
            .programs
            .get_mut(active)
            .ok_or(RenderError::UnknownProgram(active))?;
        program.uniforms_mut().write(entry, value)
    }

    pub fn set_uniform_float(&mut self, location: UniformLocation, value: f32) -> Result<()> {
        self.set_uniform(location, UniformValue::Float(value))
    }

    pub fn set_uniform_float2(&mut self, location: UniformLocation, x: f32, y: f32) -> Result<()> {
        self.set_uniform(location, UniformValue::Float2([x, y]))
    }

    // ---- frames --------------------------------------------------------

    /// Renders one `width x height` frame with the active program and copies
    /// it into the start of `out` as top-down BGRA rows.
    ///
    /// Bytes of `out` past the frame are left untouched.
    pub fn render_frame(&mut self, width: u32, height: u32, out: &mut [u8]) -> Result<()> {
        let (max_width, max_height) = self.surface.size();
        if width == 0 || height == 0 || !self.surface.contains(width, height) {
            return Err(RenderError::FrameOutOfBounds {
                width,
                height,
                max_width,
                max_height,
            });
        }

        let required = frame_len(width, height);
        if out.len() < required {
            return Err(RenderError::BufferTooSmall {
                required,
                actual: out.len(),
            });
        }

        let id = self.frame.active().ok_or(RenderError::NoProgramSelected)?;
        let program = self
            .programs
            .get_mut(id)
            .ok_or(RenderError::UnknownProgram(id))?;
        if !program.is_linked() {
            return Err(RenderError::ProgramNotLinked(id));
        }

        if program.uses_builtin_vertex() {
            program
                .uniforms_mut()
                .write_named(RESOLUTION_UNIFORM, UniformValue::Float2([width as f32, height as f32]))?;
        }

        log::trace!("rendering {width}x{height} with {id}");

        self.frame.render(
            &self.gpu,
            &self.surface,
            program,
            self.config.clear_color,
            width,
            height,
            &mut out[..required],
        )
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        log::debug!("graphics context released");
    }
}
