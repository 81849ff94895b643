//! Program building: compile two stages, check their interface, create the
//! render pipeline.

mod builder;
mod builtin;
mod handle;
mod link;

pub use builder::{Program, ProgramBuilder};
pub use builtin::{BUILTIN_VERTEX_SHADER, RESOLUTION_UNIFORM};
pub use handle::ProgramId;
pub(crate) use handle::ProgramArena;

/// Outcome of compiling a program, as returned to the host.
///
/// The handle is returned whether or not linking succeeded; drawing an
/// unlinked program fails with [`crate::RenderError::ProgramNotLinked`].
#[derive(Debug, Clone)]
pub struct ProgramBuild {
    pub id: ProgramId,
    pub linked: bool,
    /// Compile and link diagnostics of both stages; may be non-empty on success.
    pub log: String,
}

impl ProgramBuild {
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn has_log(&self) -> bool {
        !self.log.is_empty()
    }
}
