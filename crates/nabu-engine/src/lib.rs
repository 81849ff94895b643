//! Nabu engine crate.
//!
//! Headless shader-quad rendering: compile a vertex and a fragment stage into
//! a program, draw one rectangle covering the requested frame on a hidden
//! surface, and read the pixels back as BGRA bytes.
//!
//! ```no_run
//! use nabu_engine::{ContextConfig, GraphicsContext};
//!
//! # fn main() -> nabu_engine::Result<()> {
//! let mut ctx = GraphicsContext::initialize(ContextConfig::default())?;
//! let build = ctx.compile_fragment_program(
//!     "layout(location = 0) in vec2 v_uv;
//!      layout(location = 0) out vec4 o_color;
//!      void main() { o_color = vec4(v_uv, 0.0, 1.0); }",
//! );
//! ctx.select_program(build.id)?;
//!
//! let mut pixels = vec![0u8; 64 * 64 * 4];
//! ctx.render_frame(64, 64, &mut pixels)?;
//! ctx.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod error;
pub mod logging;
pub mod program;
pub mod render;
pub mod shader;
pub mod uniform;

pub use device::{ContextConfig, GraphicsContext};
pub use error::{RenderError, Result};
pub use program::{ProgramBuild, ProgramId};
pub use shader::{CompiledStage, ShaderCompiler, ShaderLanguage, StageKind};
pub use uniform::{UniformKind, UniformLocation, UniformValue};
