use cgmath::Matrix4;

use crate::math::aabb::Aabb3;
use crate::utils::hash_value::HashValue;
use crate::video::snapshot::{DrawParams, Snapshot};

use super::transform::Transform;

impl_handle!(NodeHandle);

/// A renderable unit attached to a node. The world matrix of node is written into
/// the snapshot during traversal.
///
/// The state cache ignores `Snapshot::transform`. A program sees the world matrix
/// only if `model_uniform` names the uniform that receives it.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub snapshot: Snapshot,
    pub draw: DrawParams,
    /// The uniform that receives the world matrix, if any.
    pub model_uniform: Option<HashValue<str>>,
}

impl Renderable {
    pub fn new(snapshot: Snapshot, draw: DrawParams) -> Self {
        Renderable {
            snapshot,
            draw,
            model_uniform: None,
        }
    }

    #[inline]
    pub fn with_model_uniform<T: Into<HashValue<str>>>(mut self, field: T) -> Self {
        self.model_uniform = Some(field.into());
        self
    }

    /// Resolves the final snapshot with the world matrix of its node.
    pub fn resolve(&self, world: &Matrix4<f32>) -> Snapshot {
        let mut snapshot = self.snapshot.clone();
        snapshot.set_transform(*world);
        if let Some(field) = self.model_uniform {
            snapshot.set_uniform(field, *world);
        }

        snapshot
    }
}

/// The bounding volume of a subtree, in the local space of its root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Nothing would be drawn.
    Empty,
    Finite(Aabb3),
    /// Something without bounds would be drawn, it can never be culled.
    Infinite,
}

impl Bound {
    pub fn union(self, rhs: Bound) -> Bound {
        match (self, rhs) {
            (Bound::Infinite, _) | (_, Bound::Infinite) => Bound::Infinite,
            (Bound::Empty, v) | (v, Bound::Empty) => v,
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.union(&b)),
        }
    }

    pub fn transform(self, m: &Matrix4<f32>) -> Bound {
        match self {
            Bound::Finite(aabb) => Bound::Finite(aabb.transform(m)),
            v => v,
        }
    }
}

/// `Node` keeps the tree relationships, the local transform, the bounds and the
/// renderables of an object in scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) handle: NodeHandle,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) first_child: Option<NodeHandle>,
    pub(crate) last_child: Option<NodeHandle>,
    pub(crate) next_sib: Option<NodeHandle>,
    pub(crate) prev_sib: Option<NodeHandle>,
    pub(crate) transform: Transform,
    pub(crate) bounds: Option<Aabb3>,
    pub(crate) renderables: Vec<Renderable>,
    pub(crate) dirty: bool,
    pub(crate) subtree: Bound,
}

impl Node {
    pub(crate) fn new(handle: NodeHandle) -> Self {
        Node {
            handle,
            parent: None,
            first_child: None,
            last_child: None,
            next_sib: None,
            prev_sib: None,
            transform: Transform::default(),
            bounds: None,
            renderables: Vec::new(),
            dirty: true,
            subtree: Bound::Empty,
        }
    }

    #[inline]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Gets the transform in local space.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Gets the bounds of its own renderables, in local space.
    #[inline]
    pub fn bounds(&self) -> Option<Aabb3> {
        self.bounds
    }

    #[inline]
    pub fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Gets the bounds of whole subtree in local space. Only meaningful once the graph
    /// has refreshed its bounds.
    #[inline]
    pub fn subtree_bound(&self) -> Bound {
        self.subtree
    }

    /// The bound that this node contributes by itself.
    pub(crate) fn own_bound(&self) -> Bound {
        if self.renderables.is_empty() {
            Bound::Empty
        } else {
            self.bounds.map(Bound::Finite).unwrap_or(Bound::Infinite)
        }
    }
}
