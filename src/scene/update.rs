//! The hand-over of scene graph between application thread and render thread.
//!
//! Application thread mutates a *pending* mirror of the graph, and every mutation
//! is recorded as a `ChangeRecord`. Render thread only ever reads the *active*
//! graph. At frame boundary, `UpdateManager::synchronize` replays the recorded
//! batch onto the back buffer and swaps it with the active one, so a reader sees
//! either the whole batch or none of it.
//!
//! Since the back buffer is the previous active graph, it lags one batch behind.
//! The previous batch is kept and replayed before the new one.

use std::mem;
use std::ops::Deref;
use std::sync::{Mutex, RwLockReadGuard};

use crate::errors::*;
use crate::settings::SceneSettings;
use crate::utils::double_buf::DoubleBuf;
use crate::utils::handle_pool::HandlePool;

use super::change::{Change, ChangeKind, ChangeRecord};
use super::graph::SceneGraph;
use super::node::NodeHandle;

/// The result of a `synchronize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// The generation of active graph after synchronization.
    pub generation: u64,
    /// The number of changes that have been published.
    pub applied: usize,
    /// The number of changes that were rejected while replaying.
    pub skipped: usize,
    /// Returns false if there is nothing to publish.
    pub swapped: bool,
    /// Published changes that create, destroy or re-parent nodes.
    pub structural: usize,
    pub transforms: usize,
    pub bounds: usize,
    /// Published changes that attach or detach renderables.
    pub states: usize,
}

impl SyncReport {
    fn count(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Structural => self.structural += 1,
            ChangeKind::Transform => self.transforms += 1,
            ChangeKind::Bounds => self.bounds += 1,
            ChangeKind::State => self.states += 1,
        }
    }
}

#[derive(Debug, Default)]
struct Published {
    graph: SceneGraph,
    generation: u64,
}

struct Pending {
    handles: HandlePool<NodeHandle>,
    graph: SceneGraph,
    changes: Vec<ChangeRecord>,
}

pub struct UpdateManager {
    pending: Mutex<Pending>,
    replay: Mutex<Vec<ChangeRecord>>,
    buffers: DoubleBuf<Published>,
    settings: SceneSettings,
}

impl Default for UpdateManager {
    fn default() -> Self {
        UpdateManager::new(SceneSettings::default())
    }
}

impl UpdateManager {
    pub fn new(settings: SceneSettings) -> Self {
        let pending = Pending {
            handles: HandlePool::new(),
            graph: SceneGraph::new(),
            changes: Vec::with_capacity(settings.pending_capacity),
        };

        UpdateManager {
            pending: Mutex::new(pending),
            replay: Mutex::new(Vec::new()),
            buffers: DoubleBuf::default(),
            settings,
        }
    }

    /// Allocates a new node handle and records its creation.
    pub fn create_node(&self) -> Result<NodeHandle> {
        let mut pending = self.pending.lock().unwrap();
        let handle = pending.handles.create();
        let record = ChangeRecord::new(handle, Change::Create);

        if let Err(err) = pending.graph.apply(&record) {
            pending.handles.free(handle);
            return Err(err);
        }

        pending.changes.push(record);
        Ok(handle)
    }

    /// Records a change of node. The change is validated against the pending graph
    /// first, a rejected change leaves everything untouched.
    ///
    /// Node creation goes through `create_node` since it allocates the handle.
    pub fn record_change(&self, node: NodeHandle, change: Change) -> Result<()> {
        self.record_change_if(node, change, |_| Ok(()))
    }

    /// Records a change of node if `check` passes with the pending graph. The check
    /// and the recording happen under the same lock.
    pub fn record_change_if<F>(&self, node: NodeHandle, change: Change, check: F) -> Result<()>
    where
        F: FnOnce(&SceneGraph) -> Result<()>,
    {
        if let Change::Create = change {
            return Err(Error::NodeInvalid(node));
        }

        let mut pending = self.pending.lock().unwrap();
        check(&pending.graph)?;

        let record = ChangeRecord::new(node, change);
        let destroyed: Vec<NodeHandle> = match record.change {
            Change::Destroy if pending.graph.contains(node) => ::std::iter::once(node)
                .chain(pending.graph.descendants(node))
                .collect(),
            _ => Vec::new(),
        };

        pending.graph.apply(&record)?;

        for v in destroyed {
            pending.handles.free(v);
        }

        pending.changes.push(record);
        Ok(())
    }

    /// Returns the number of changes waiting for next `synchronize`.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().changes.len()
    }

    /// Reads the graph as the application sees it, including unpublished changes.
    pub fn pending_graph<F, R>(&self, func: F) -> R
    where
        F: FnOnce(&SceneGraph) -> R,
    {
        let pending = self.pending.lock().unwrap();
        func(&pending.graph)
    }

    /// Returns the generation of active graph. It increases by one every time a
    /// batch is published.
    pub fn generation(&self) -> u64 {
        self.buffers.read_front_buf().generation
    }

    /// Publishes all the pending changes.
    ///
    /// Blocks until every outstanding `ActiveGraph` has been dropped, so it must not
    /// be called while holding one on the same thread.
    pub fn synchronize(&self) -> Result<SyncReport> {
        let mut replay = self.replay.lock().unwrap();

        let batch = {
            let mut pending = self.pending.lock().unwrap();
            if pending.changes.is_empty() {
                return Ok(SyncReport {
                    generation: self.generation(),
                    ..Default::default()
                });
            }

            let capacity = self.settings.pending_capacity.max(pending.changes.len());
            mem::replace(&mut pending.changes, Vec::with_capacity(capacity))
        };

        let mut report = SyncReport {
            swapped: true,
            ..Default::default()
        };

        {
            let mut back = self.buffers.write_back_buf();

            for v in replay.iter() {
                if let Err(err) = back.graph.apply(v) {
                    error!("Failed to catch up with {:?}. {}", v, err);
                }
            }

            for v in &batch {
                match back.graph.apply(v) {
                    Ok(()) => {
                        report.applied += 1;
                        report.count(v.kind());
                    }
                    Err(err) => {
                        error!("Failed to apply {:?}. {}", v, err);
                        report.skipped += 1;
                    }
                }
            }

            back.graph.refresh_bounds();
        }

        let mut generation = 0;
        self.buffers.swap_with(|front, back| {
            front.generation = back.generation + 1;
            generation = front.generation;
        });

        report.generation = generation;

        trace!("Synchronized scene graph. {:?}", report);
        *replay = batch;
        Ok(report)
    }

    /// Acquires the active graph. `synchronize` waits until it has been dropped.
    pub fn active(&self) -> ActiveGraph {
        ActiveGraph {
            guard: self.buffers.read_front_buf(),
        }
    }
}

/// A read-only view of the active graph.
pub struct ActiveGraph<'a> {
    guard: RwLockReadGuard<'a, Published>,
}

impl<'a> ActiveGraph<'a> {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.guard.generation
    }
}

impl<'a> Deref for ActiveGraph<'a> {
    type Target = SceneGraph;

    fn deref(&self) -> &Self::Target {
        &self.guard.graph
    }
}
