/// Largest frame width supported by a context created with default settings.
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Largest frame height supported by a context created with default settings.
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Initialization parameters for a [`super::GraphicsContext`].
///
/// `max_width`/`max_height` size the hidden surface once; every later
/// `render_frame` call must fit inside that bound.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Width of the off-screen surface, in pixels.
    pub max_width: u32,

    /// Height of the off-screen surface, in pixels.
    pub max_height: u32,

    /// Color written by the clear at the start of every frame.
    pub clear_color: wgpu::Color,

    /// Backends wgpu may pick from.
    ///
    /// The `WGPU_BACKEND` environment variable, when set, takes precedence.
    pub backends: wgpu::Backends,

    /// Adapter selection hint.
    pub power_preference: wgpu::PowerPreference,

    /// Request a software adapter instead of a hardware one.
    pub force_fallback_adapter: bool,

    /// Limits requested from the device.
    ///
    /// `max_texture_dimension_2d` is raised to fit the surface bound when needed.
    pub required_limits: wgpu::Limits,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            clear_color: wgpu::Color::TRANSPARENT,
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}

impl ContextConfig {
    /// Returns a copy with a different surface bound.
    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Returns a copy with a different clear color.
    pub fn with_clear_color(mut self, clear_color: wgpu::Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Backends after applying the `WGPU_BACKEND` override.
    pub(crate) fn effective_backends(&self) -> wgpu::Backends {
        wgpu::Backends::from_env().unwrap_or(self.backends)
    }

    /// Largest texture side length the surface bound needs.
    pub(crate) fn required_dimension(&self) -> u32 {
        self.max_width.max(self.max_height)
    }
}
