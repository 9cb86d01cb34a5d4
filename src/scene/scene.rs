use std::sync::Arc;

use crate::errors::*;
use crate::math::aabb::Aabb3;

use super::change::Change;
use super::graph::SceneGraph;
use super::node::{NodeHandle, Renderable};
use super::transform::Transform;
use super::update::UpdateManager;

/// The application-side interface of scene graph. Every mutation is recorded and
/// becomes visible to the render thread after next `UpdateManager::synchronize`.
///
/// `Scene` is cheap to clone, all the clones record into the same manager.
#[derive(Clone)]
pub struct Scene {
    manager: Arc<UpdateManager>,
}

impl Scene {
    pub fn new(manager: Arc<UpdateManager>) -> Self {
        Scene { manager }
    }

    #[inline]
    pub fn manager(&self) -> &Arc<UpdateManager> {
        &self.manager
    }

    /// Creates a detached node.
    #[inline]
    pub fn create_node(&self) -> Result<NodeHandle> {
        self.manager.create_node()
    }

    /// Destroys the node and all of its descendants.
    #[inline]
    pub fn destroy_node(&self, node: NodeHandle) -> Result<()> {
        self.manager.record_change(node, Change::Destroy)
    }

    /// Sets the transform of node in the space of its parent.
    #[inline]
    pub fn set_transform(&self, node: NodeHandle, transform: Transform) -> Result<()> {
        self.manager.record_change(node, Change::Transform(transform))
    }

    /// Sets the local bounds of the renderables of node. Renderables without bounds
    /// are never culled.
    #[inline]
    pub fn set_bounds<T>(&self, node: NodeHandle, bounds: T) -> Result<()>
    where
        T: Into<Option<Aabb3>>,
    {
        self.manager.record_change(node, Change::Bounds(bounds.into()))
    }

    /// Appends `child` to the children of `parent`, detaching it from its former
    /// parent first.
    #[inline]
    pub fn add_child(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.manager
            .record_change(child, Change::SetParent(Some(parent)))
    }

    /// Detaches `child` from `parent`, it becomes a root.
    pub fn remove_child(&self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        self.manager
            .record_change_if(child, Change::SetParent(None), |graph| {
                if !graph.contains(child) {
                    return Err(Error::NodeInvalid(child));
                }

                if graph.parent(child) != Some(parent) {
                    return Err(Error::NotAChild { child, parent });
                }

                Ok(())
            })
    }

    /// Attaches a renderable to node. Without a model uniform, the transforms of node
    /// and its ancestors never reach the program.
    pub fn attach_state(&self, node: NodeHandle, renderable: Renderable) -> Result<()> {
        if renderable.model_uniform.is_none() && renderable.snapshot.program.is_some() {
            debug!("{} attaches a renderable without model uniform.", node);
        }

        self.manager
            .record_change(node, Change::AttachState(renderable))
    }

    #[inline]
    pub fn detach_states(&self, node: NodeHandle) -> Result<()> {
        self.manager.record_change(node, Change::DetachStates)
    }

    /// Returns the number of unpublished changes.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.manager.pending_len()
    }

    /// Reads the graph with all the unpublished changes.
    #[inline]
    pub fn pending<F, R>(&self, func: F) -> R
    where
        F: FnOnce(&SceneGraph) -> R,
    {
        self.manager.pending_graph(func)
    }
}
