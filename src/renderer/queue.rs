use std::cmp::Ordering;
use std::slice::Iter;

use crate::video::snapshot::{DrawParams, OpacityClass, Snapshot};

/// A single draw of the frame, with the complete state it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// The order of this entry during traversal.
    pub index: usize,
    pub snapshot: Snapshot,
    pub draw: DrawParams,
}

impl QueueEntry {
    #[inline]
    pub fn opacity(&self) -> OpacityClass {
        self.snapshot.opacity()
    }
}

/// Traversal statistics of the cull stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CullStats {
    pub visited: usize,
    pub culled: usize,
}

/// Collects entries in traversal order.
#[derive(Debug, Default)]
pub struct QueueBuilder {
    entries: Vec<QueueEntry>,
    stats: CullStats,
}

impl QueueBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        QueueBuilder {
            entries: Vec::with_capacity(capacity),
            stats: CullStats::default(),
        }
    }

    /// Appends a draw, returns its traversal index.
    pub fn push(&mut self, snapshot: Snapshot, draw: DrawParams) -> usize {
        let index = self.entries.len();
        self.entries.push(QueueEntry {
            index,
            snapshot,
            draw,
        });

        index
    }

    #[inline]
    pub fn visit(&mut self) {
        self.stats.visited += 1;
    }

    #[inline]
    pub fn cull(&mut self) {
        self.stats.culled += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorts the entries and seals the queue.
    ///
    /// Opaque entries come first, ordered by their pipeline state so that entries
    /// sharing leading axes become adjacent. Blended entries follow in traversal
    /// order. The sort is stable, equal entries keep their traversal order.
    pub fn build(mut self) -> CommandQueue {
        self.entries.sort_by(compare);
        CommandQueue {
            entries: self.entries,
            stats: self.stats,
        }
    }
}

fn compare(lhs: &QueueEntry, rhs: &QueueEntry) -> Ordering {
    let (lo, ro) = (lhs.opacity(), rhs.opacity());
    if lo != ro {
        return lo.cmp(&ro);
    }

    let state = match lo {
        OpacityClass::Opaque => lhs.snapshot.state_cmp(&rhs.snapshot),
        OpacityClass::Blended => Ordering::Equal,
    };

    state.then_with(|| lhs.index.cmp(&rhs.index))
}

/// The ordered draws of one frame. It is immutable once built, and consumed by a
/// single draw pass.
#[derive(Debug, Default)]
pub struct CommandQueue {
    entries: Vec<QueueEntry>,
    stats: CullStats,
}

impl CommandQueue {
    #[inline]
    pub fn iter(&self) -> Iter<QueueEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[QueueEntry] {
        &self.entries
    }

    #[inline]
    pub fn stats(&self) -> CullStats {
        self.stats
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a QueueEntry;
    type IntoIter = Iter<'a, QueueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::handle::Handle;
    use crate::video::snapshot::{ProgramHandle, RenderState};

    fn snapshot(program: u32, blended: bool) -> Snapshot {
        let state = if blended {
            RenderState::transparent()
        } else {
            RenderState::opaque()
        };

        Snapshot::new()
            .with_program(ProgramHandle::from(Handle::new(program, 1)))
            .with_state(state)
    }

    #[test]
    fn opaque_first() {
        let mut builder = QueueBuilder::new();
        builder.push(snapshot(2, true), DrawParams::default());
        builder.push(snapshot(3, false), DrawParams::default());
        builder.push(snapshot(1, true), DrawParams::default());
        builder.push(snapshot(1, false), DrawParams::default());
        builder.push(snapshot(3, false), DrawParams::default());

        let queue = builder.build();
        let order: Vec<_> = queue.iter().map(|v| v.index).collect();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn empty() {
        let queue = QueueBuilder::with_capacity(16).build();
        assert!(queue.is_empty());
        assert_eq!(queue.stats(), CullStats::default());
    }
}
