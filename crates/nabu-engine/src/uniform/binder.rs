use std::collections::HashMap;

use crate::error::{RenderError, Result};
use crate::shader::reflect::UniformBlock;

use super::{UniformKind, UniformValue};

/// A resolved uniform name: its slot in the binder and declared kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct UniformEntry {
    pub slot: usize,
    pub kind: UniformKind,
}

/// `(block, offset)` copies written together for one slot.
type Targets = Vec<(usize, u32)>;

#[derive(Debug)]
struct BlockData {
    bytes: Vec<u8>,
    dirty: bool,
}

/// Name lookup and CPU-side storage for a program's uniform blocks.
///
/// Members are reachable by their bare name, and by `instance.member` when the
/// block has an instance name. A bare name declared in several blocks with the
/// same kind writes every copy; with a different kind the first block wins.
#[derive(Debug, Default)]
pub struct UniformBinder {
    blocks: Vec<BlockData>,
    slots: Vec<Targets>,
    table: HashMap<String, UniformEntry>,
    names: Vec<String>,
}

impl UniformBinder {
    pub(crate) fn new(blocks: &[UniformBlock]) -> Self {
        let mut binder = Self::default();

        for (index, block) in blocks.iter().enumerate() {
            binder.blocks.push(BlockData {
                bytes: vec![0; buffer_size(block.size) as usize],
                dirty: false,
            });

            for member in &block.members {
                let target = (index, member.offset);

                match binder.table.get(&member.name).copied() {
                    Some(entry) if entry.kind == member.kind => {
                        binder.slots[entry.slot].push(target);
                    }
                    Some(_) => {
                        log::debug!(
                            "uniform `{}` declared with different types; keeping the first",
                            member.name
                        );
                    }
                    None => {
                        let entry = binder.push_slot(target, member.kind);
                        binder.table.insert(member.name.clone(), entry);
                        binder.names.push(member.name.clone());
                    }
                }

                if let Some(instance) = &block.name {
                    let entry = binder.push_slot(target, member.kind);
                    binder.table.insert(format!("{instance}.{}", member.name), entry);
                }
            }
        }

        binder
    }

    fn push_slot(&mut self, target: (usize, u32), kind: UniformKind) -> UniformEntry {
        self.slots.push(vec![target]);
        UniformEntry {
            slot: self.slots.len() - 1,
            kind,
        }
    }

    /// Resolves `name`, `None` if the program has no such uniform.
    pub(crate) fn locate(&self, name: &str) -> Option<UniformEntry> {
        self.table.get(name).copied()
    }

    /// Uniform names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Writes `value` into the CPU copies; uploaded on the next [`Self::flush`].
    pub(crate) fn write(&mut self, entry: UniformEntry, value: UniformValue) -> Result<()> {
        if entry.kind != value.kind() {
            return Err(RenderError::UniformTypeMismatch {
                expected: entry.kind,
                actual: value.kind(),
            });
        }

        let bytes = value.as_bytes();
        let Some(targets) = self.slots.get(entry.slot) else {
            return Ok(());
        };

        for &(index, offset) in targets {
            let start = offset as usize;
            let Some(block) = self.blocks.get_mut(index) else {
                continue;
            };
            let Some(dst) = block.bytes.get_mut(start..start + bytes.len()) else {
                log::warn!("uniform write at offset {start} falls outside its block");
                continue;
            };

            dst.copy_from_slice(bytes);
            block.dirty = true;
        }
        Ok(())
    }

    /// Writes `value` to the uniform called `name` if it exists.
    ///
    /// Returns `Ok(false)` when the program has no such uniform.
    pub(crate) fn write_named(&mut self, name: &str, value: UniformValue) -> Result<bool> {
        match self.locate(name) {
            Some(entry) => self.write(entry, value).map(|()| true),
            None => Ok(false),
        }
    }

    /// Hands every modified block to `upload` and clears the dirty flags.
    pub(crate) fn flush(&mut self, mut upload: impl FnMut(usize, &[u8])) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            if block.dirty {
                upload(index, &block.bytes);
                block.dirty = false;
            }
        }
    }
}

/// GPU buffer size for a block of `size` bytes: at least 16, 16-aligned.
pub(crate) fn buffer_size(size: u32) -> u32 {
    size.max(16).next_multiple_of(16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::reflect::UniformMember;

    fn member(name: &str, offset: u32, kind: UniformKind) -> UniformMember {
        UniformMember {
            name: name.to_owned(),
            offset,
            kind,
        }
    }

    fn frame_block() -> UniformBlock {
        UniformBlock {
            group: 0,
            binding: 0,
            name: Some("frame".to_owned()),
            size: 16,
            members: vec![
                member("resolution", 0, UniformKind::Float2),
                member("time", 8, UniformKind::Float),
            ],
        }
    }

    #[test]
    fn locate_by_bare_and_qualified_name() {
        let binder = UniformBinder::new(&[frame_block()]);
        let bare = binder.locate("time").unwrap();
        assert_eq!(bare.kind, UniformKind::Float);
        assert_eq!(binder.locate("frame.time").map(|e| e.kind), Some(UniformKind::Float));
        assert!(binder.locate("mouse").is_none());
        assert_eq!(binder.names().collect::<Vec<_>>(), vec!["resolution", "time"]);
    }

    #[test]
    fn write_marks_block_dirty_and_flush_uploads_once() {
        let mut binder = UniformBinder::new(&[frame_block()]);
        let entry = binder.locate("time").unwrap();
        binder.write(entry, UniformValue::Float(2.5)).unwrap();

        let mut uploads = Vec::new();
        binder.flush(|index, bytes| uploads.push((index, bytes.to_vec())));
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, 0);
        assert_eq!(&uploads[0].1[8..12], &2.5f32.to_ne_bytes());
        assert_eq!(uploads[0].1.len(), 16);

        binder.flush(|_, _| panic!("nothing changed"));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut binder = UniformBinder::new(&[frame_block()]);
        let entry = binder.locate("resolution").unwrap();
        let err = binder.write(entry, UniformValue::Float(1.0)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::UniformTypeMismatch {
                expected: UniformKind::Float2,
                actual: UniformKind::Float
            }
        ));
    }

    #[test]
    fn write_named_reports_absence() {
        let mut binder = UniformBinder::new(&[frame_block()]);
        assert!(binder.write_named("resolution", UniformValue::Float2([4.0, 3.0])).unwrap());
        assert!(!binder.write_named("mouse", UniformValue::Float2([0.0, 0.0])).unwrap());
    }

    fn uploads(binder: &mut UniformBinder) -> Vec<(usize, Vec<u8>)> {
        let mut uploads = Vec::new();
        binder.flush(|index, bytes| uploads.push((index, bytes.to_vec())));
        uploads
    }

    #[test]
    fn shared_name_writes_every_block() {
        let loose = UniformBlock {
            group: 0,
            binding: 15,
            name: None,
            size: 16,
            members: vec![
                member("time", 0, UniformKind::Float),
                member("resolution", 8, UniformKind::Float2),
            ],
        };
        let mut binder = UniformBinder::new(&[frame_block(), loose]);
        assert_eq!(binder.names().collect::<Vec<_>>(), vec!["resolution", "time"]);

        assert!(binder.write_named("resolution", UniformValue::Float2([64.0, 32.0])).unwrap());
        let first = uploads(&mut binder);
        assert_eq!(first.len(), 2);
        assert_eq!(&first[0].1[0..4], &64.0f32.to_ne_bytes());
        assert_eq!(&first[1].1[8..12], &64.0f32.to_ne_bytes());

        // The qualified name reaches only its own block.
        let qualified = binder.locate("frame.time").unwrap();
        binder.write(qualified, UniformValue::Float(1.0)).unwrap();
        assert_eq!(uploads(&mut binder).len(), 1);
    }

    #[test]
    fn first_block_wins_on_type_clash() {
        let other = UniformBlock {
            group: 0,
            binding: 1,
            name: None,
            size: 16,
            members: vec![member("time", 0, UniformKind::Float4)],
        };
        let mut binder = UniformBinder::new(&[frame_block(), other]);
        assert_eq!(binder.locate("time").unwrap().kind, UniformKind::Float);

        binder.write_named("time", UniformValue::Float(3.0)).unwrap();
        let uploads = uploads(&mut binder);
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, 0);
        assert_eq!(binder.names().count(), 2);
    }

    #[test]
    fn buffer_sizes_are_aligned() {
        assert_eq!(buffer_size(0), 16);
        assert_eq!(buffer_size(4), 16);
        assert_eq!(buffer_size(17), 32);
        assert_eq!(buffer_size(32), 32);
    }
}
