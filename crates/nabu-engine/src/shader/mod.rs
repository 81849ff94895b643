//! Shader stage compilation.
//!
//! Stages are compiled independently into validated naga IR. Compile errors
//! never panic or propagate as `Err`; they are reported through
//! [`CompiledStage::success`] and [`CompiledStage::log`].

mod compiler;
mod glsl;
pub mod reflect;

pub use compiler::{CompiledStage, ShaderCompiler, ShaderLanguage, StageKind};
pub use glsl::{loose_uniform_binding, DEFAULT_GLSL_VERSION};
