use crate::math::aabb::Aabb3;

use super::node::{NodeHandle, Renderable};
use super::transform::Transform;

/// A single mutation of scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// Creates a detached node.
    Create,
    /// Destroys the node and all of its descendants.
    Destroy,
    Transform(Transform),
    Bounds(Option<Aabb3>),
    AttachState(Renderable),
    DetachStates,
    /// Re-parents the node, appending it after existing children. `None` detaches
    /// it into a root.
    SetParent(Option<NodeHandle>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Structural,
    Transform,
    Bounds,
    State,
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match *self {
            Change::Create | Change::Destroy | Change::SetParent(_) => ChangeKind::Structural,
            Change::Transform(_) => ChangeKind::Transform,
            Change::Bounds(_) => ChangeKind::Bounds,
            Change::AttachState(_) | Change::DetachStates => ChangeKind::State,
        }
    }
}

/// A change and the node it applies to. Records are applied exactly once, in the
/// order they were recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub node: NodeHandle,
    pub change: Change,
}

impl ChangeRecord {
    #[inline]
    pub fn new(node: NodeHandle, change: Change) -> Self {
        ChangeRecord { node, change }
    }

    #[inline]
    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }
}
