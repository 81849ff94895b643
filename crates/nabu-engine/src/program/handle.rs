use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use super::Program;

static NEXT_ARENA: AtomicU32 = AtomicU32::new(0);

/// Handle of a program owned by a [`crate::device::GraphicsContext`].
///
/// Handles are indices into an append-only arena and stay valid until the
/// context is shut down. A handle from one context is unknown to every other.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId {
    arena: u32,
    index: u32,
}

impl ProgramId {
    /// Arena index of this program.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program #{}", self.index)
    }
}

/// Append-only program storage.
pub(crate) struct ProgramArena {
    id: u32,
    programs: Vec<Program>,
}

impl Default for ProgramArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramArena {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            programs: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, program: Program) -> ProgramId {
        let id = ProgramId {
            arena: self.id,
            index: self.programs.len() as u32,
        };
        self.programs.push(program);
        id
    }

    pub(crate) fn get(&self, id: ProgramId) -> Option<&Program> {
        if id.arena != self.id {
            return None;
        }
        self.programs.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ProgramId) -> Option<&mut Program> {
        if id.arena != self.id {
            return None;
        }
        self.programs.get_mut(id.index())
    }

    pub(crate) fn len(&self) -> usize {
        self.programs.len()
    }
}
