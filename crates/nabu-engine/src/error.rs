use thiserror::Error;

use crate::program::ProgramId;
use crate::uniform::UniformKind;

/// Errors reported by the engine.
///
/// Shader problems are not errors: compile and link diagnostics travel in
/// [`crate::shader::CompiledStage`] and [`crate::program::ProgramBuild`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to find a suitable GPU adapter")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create wgpu device/queue")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface bound must be non-zero, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },

    #[error("surface bound {width}x{height} exceeds the adapter texture limit of {limit}")]
    SurfaceTooLarge { width: u32, height: u32, limit: u32 },

    #[error("no program selected")]
    NoProgramSelected,

    #[error("unknown {0}")]
    UnknownProgram(ProgramId),

    #[error("{0} failed to link")]
    ProgramNotLinked(ProgramId),

    #[error("frame {width}x{height} is outside the surface bound {max_width}x{max_height}")]
    FrameOutOfBounds {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("output buffer holds {actual} bytes, frame needs {required}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("uniform location belongs to {location}, but {active} is active")]
    ForeignUniform {
        location: ProgramId,
        active: ProgramId,
    },

    #[error("uniform is {expected:?}, got a {actual:?} value")]
    UniformTypeMismatch {
        expected: UniformKind,
        actual: UniformKind,
    },

    #[error("readback mapping failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("readback callback was dropped before completing")]
    ReadbackAborted,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RenderError>;
