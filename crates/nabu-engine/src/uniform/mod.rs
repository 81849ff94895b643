//! Uniform lookup and storage.
//!
//! Uniforms live in uniform buffers declared by the shaders. Each program keeps
//! a CPU copy of its blocks; writes land there and are uploaded right before the
//! next draw.

mod binder;

pub use binder::UniformBinder;
pub(crate) use binder::{buffer_size, UniformEntry};

use crate::program::ProgramId;

/// Shape of a uniform variable as declared in the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    /// Anything the binder cannot write (matrices, arrays, nested structs).
    Other,
}

impl UniformKind {
    /// Size in bytes of a value of this kind.
    pub const fn byte_size(self) -> Option<u32> {
        match self {
            UniformKind::Float | UniformKind::Int => Some(4),
            UniformKind::Float2 => Some(8),
            UniformKind::Float3 => Some(12),
            UniformKind::Float4 => Some(16),
            UniformKind::Other => None,
        }
    }
}

/// A value written into a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Int(i32),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Float2(_) => UniformKind::Float2,
            UniformValue::Float3(_) => UniformKind::Float3,
            UniformValue::Float4(_) => UniformKind::Float4,
            UniformValue::Int(_) => UniformKind::Int,
        }
    }

    /// Native-endian bytes as laid out in the uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Float2(v) => bytemuck::cast_slice(v),
            UniformValue::Float3(v) => bytemuck::cast_slice(v),
            UniformValue::Float4(v) => bytemuck::cast_slice(v),
            UniformValue::Int(v) => bytemuck::bytes_of(v),
        }
    }
}

/// Resolved uniform variable of one program.
///
/// [`UniformLocation::NOT_FOUND`] is a valid value: the variable may be absent
/// or optimized out, and writing to it does nothing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    slot: Option<(ProgramId, UniformEntry)>,
}

impl UniformLocation {
    pub const NOT_FOUND: Self = Self { slot: None };

    pub(crate) fn found(program: ProgramId, entry: UniformEntry) -> Self {
        Self {
            slot: Some((program, entry)),
        }
    }

    pub fn is_found(&self) -> bool {
        self.slot.is_some()
    }

    /// Declared kind, if found.
    pub fn kind(&self) -> Option<UniformKind> {
        self.slot.map(|(_, entry)| entry.kind)
    }

    /// Program the location was resolved against, if found.
    pub fn program(&self) -> Option<ProgramId> {
        self.slot.map(|(program, _)| program)
    }

    pub(crate) fn slot(&self) -> Option<(ProgramId, UniformEntry)> {
        self.slot
    }
}

impl Default for UniformLocation {
    fn default() -> Self {
        Self::NOT_FOUND
    }
}
