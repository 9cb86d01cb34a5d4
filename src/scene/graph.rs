use std::collections::BTreeSet;
use std::collections::btree_set;
use std::iter;

use cgmath::Matrix4;

use crate::errors::*;
use crate::utils::handle::Handle;

use super::change::{Change, ChangeRecord};
use super::node::{Bound, Node, NodeHandle};
use super::transform::Transform;

/// A simple scene graph that stores the tree relationships between nodes, with their
/// local transforms, bounds and renderables.
///
/// Nodes are addressed by `NodeHandle`, every access goes through the arena, which keeps
/// `SceneGraph` a plain value that could be cloned and sent across threads.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: BTreeSet<NodeHandle>,
    len: usize,
}

impl SceneGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Gets the number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.get(handle).is_some()
    }

    #[inline]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes
            .get(handle.index() as usize)
            .and_then(|v| v.as_ref())
            .filter(|v| v.handle == handle)
    }

    #[inline]
    fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes
            .get_mut(handle.index() as usize)
            .and_then(|v| v.as_mut())
            .filter(|v| v.handle == handle)
    }

    /// Returns an iterator of the roots, sorted by handle.
    #[inline]
    pub fn roots(&self) -> btree_set::Iter<NodeHandle> {
        self.roots.iter()
    }

    /// Gets the parent node.
    #[inline]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.get(handle).and_then(|v| v.parent)
    }

    /// Returns ture if this is the root of a hierarchy, aka. has no parent.
    #[inline]
    pub fn is_root(&self, handle: NodeHandle) -> bool {
        self.get(handle).map(|v| v.parent.is_none()).unwrap_or(false)
    }

    /// Returns ture if this is the leaf of a hierarchy, aka. has no child.
    #[inline]
    pub fn is_leaf(&self, handle: NodeHandle) -> bool {
        self.get(handle)
            .map(|v| v.first_child.is_none())
            .unwrap_or(false)
    }

    /// Return true if rhs is one of the ancestor of lhs.
    #[inline]
    pub fn is_ancestor(&self, lhs: NodeHandle, rhs: NodeHandle) -> bool {
        self.ancestors(lhs).any(|v| v == rhs)
    }

    /// Returns an iterator of references to its ancestors.
    #[inline]
    pub fn ancestors(&self, handle: NodeHandle) -> Ancestors {
        Ancestors {
            cursor: self.parent(handle),
            graph: self,
        }
    }

    /// Returns an iterator of references to its children, in sibling order.
    #[inline]
    pub fn children(&self, handle: NodeHandle) -> Children {
        Children {
            cursor: self.get(handle).and_then(|v| v.first_child),
            graph: self,
        }
    }

    /// Returns an iterator of references to its descendants in tree order.
    #[inline]
    pub fn descendants(&self, handle: NodeHandle) -> Descendants {
        Descendants {
            root: handle,
            cursor: self.get(handle).and_then(|v| v.first_child),
            graph: self,
        }
    }

    /// Gets the transform in world space.
    pub fn world_transform(&self, handle: NodeHandle) -> Option<Transform> {
        self.get(handle).map(|node| {
            self.ancestors(handle)
                .filter_map(|v| self.get(v))
                .fold(node.transform, |acc, rhs| rhs.transform * acc)
        })
    }

    /// Gets the matrix from local space into world space.
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Matrix4<f32>> {
        self.get(handle).map(|node| {
            self.ancestors(handle)
                .filter_map(|v| self.get(v))
                .fold(node.transform.matrix(), |acc, rhs| {
                    rhs.transform.matrix() * acc
                })
        })
    }
}

impl SceneGraph {
    /// Checks that `record` could be applied without breaking the tree.
    pub fn validate(&self, record: &ChangeRecord) -> Result<()> {
        let node = record.node;
        match record.change {
            Change::Create => {
                let occupied = self
                    .nodes
                    .get(node.index() as usize)
                    .map(|v| v.is_some())
                    .unwrap_or(false);

                if !Handle::from(node).is_valid() || occupied {
                    return Err(Error::NodeInvalid(node));
                }
            }
            Change::SetParent(Some(parent)) => {
                if !self.contains(node) {
                    return Err(Error::NodeInvalid(node));
                }

                if !self.contains(parent) {
                    return Err(Error::NodeInvalid(parent));
                }

                if parent == node || self.is_ancestor(parent, node) {
                    return Err(Error::StructuralViolation {
                        child: node,
                        parent,
                    });
                }
            }
            _ => {
                if !self.contains(node) {
                    return Err(Error::NodeInvalid(node));
                }
            }
        }

        Ok(())
    }

    /// Applies a change. The graph is left untouched if the change is rejected.
    pub fn apply(&mut self, record: &ChangeRecord) -> Result<()> {
        self.validate(record)?;

        let handle = record.node;
        match record.change {
            Change::Create => self.create(handle),
            Change::Destroy => self.destroy(handle),
            Change::Transform(transform) => {
                if let Some(node) = self.get_mut(handle) {
                    node.transform = transform;
                }

                self.mark_dirty(handle);
            }
            Change::Bounds(bounds) => {
                if let Some(node) = self.get_mut(handle) {
                    node.bounds = bounds;
                }

                self.mark_dirty(handle);
            }
            Change::AttachState(ref renderable) => {
                if let Some(node) = self.get_mut(handle) {
                    node.renderables.push(renderable.clone());
                }

                self.mark_dirty(handle);
            }
            Change::DetachStates => {
                if let Some(node) = self.get_mut(handle) {
                    node.renderables.clear();
                }

                self.mark_dirty(handle);
            }
            Change::SetParent(parent) => {
                self.unlink(handle);
                if let Some(parent) = parent {
                    self.link(handle, parent);
                }
            }
        }

        Ok(())
    }

    fn create(&mut self, handle: NodeHandle) {
        let index = handle.index() as usize;
        if self.nodes.len() <= index {
            self.nodes.resize(index + 1, None);
        }

        self.nodes[index] = Some(Node::new(handle));
        self.roots.insert(handle);
        self.len += 1;
    }

    fn destroy(&mut self, handle: NodeHandle) {
        self.unlink(handle);
        self.roots.remove(&handle);

        let removes: Vec<_> = iter::once(handle).chain(self.descendants(handle)).collect();
        for v in removes {
            self.nodes[v.index() as usize] = None;
            self.len -= 1;
        }
    }

    /// Appends `child` after the existing children of `parent`.
    fn link(&mut self, child: NodeHandle, parent: NodeHandle) {
        let last_child = match self.get_mut(parent) {
            Some(node) => {
                let prev = node.last_child.replace(child);
                if prev.is_none() {
                    node.first_child = Some(child);
                }

                prev
            }
            None => return,
        };

        if let Some(prev) = last_child {
            if let Some(node) = self.get_mut(prev) {
                node.next_sib = Some(child);
            }
        }

        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev_sib = last_child;
            node.next_sib = None;
        }

        self.roots.remove(&child);
        self.mark_dirty(parent);
    }

    /// Detaches a node from its parent and siblings, making it a root. Children are
    /// not affected.
    fn unlink(&mut self, child: NodeHandle) {
        let (parent, next_sib, prev_sib) = match self.get_mut(child) {
            Some(node) => (
                node.parent.take(),
                node.next_sib.take(),
                node.prev_sib.take(),
            ),
            None => return,
        };

        if let Some(next_sib) = next_sib {
            if let Some(node) = self.get_mut(next_sib) {
                node.prev_sib = prev_sib;
            }
        }

        if let Some(prev_sib) = prev_sib {
            if let Some(node) = self.get_mut(prev_sib) {
                node.next_sib = next_sib;
            }
        }

        if let Some(parent) = parent {
            if let Some(node) = self.get_mut(parent) {
                if prev_sib.is_none() {
                    node.first_child = next_sib;
                }

                if next_sib.is_none() {
                    node.last_child = prev_sib;
                }
            }

            self.mark_dirty(parent);
        }

        self.roots.insert(child);
    }

    /// Marks the node and all of its ancestors, their subtree bounds need to be
    /// computed again.
    fn mark_dirty(&mut self, handle: NodeHandle) {
        let mut cursor = Some(handle);
        while let Some(v) = cursor {
            cursor = match self.get_mut(v) {
                Some(node) => {
                    node.dirty = true;
                    node.parent
                }
                None => None,
            };
        }
    }

    /// Recomputes the subtree bounds of every dirty node, bottom-up.
    pub fn refresh_bounds(&mut self) {
        let roots: Vec<_> = self.roots.iter().cloned().collect();
        for v in roots {
            self.refresh(v);
        }
    }

    fn refresh(&mut self, handle: NodeHandle) -> Bound {
        let mut bound = match self.get(handle) {
            Some(node) if !node.dirty => return node.subtree,
            Some(node) => node.own_bound(),
            None => return Bound::Empty,
        };

        let children: Vec<_> = self.children(handle).collect();
        for child in children {
            let subtree = self.refresh(child);
            if let Some(node) = self.get(child) {
                bound = bound.union(subtree.transform(&node.transform.matrix()));
            }
        }

        if let Some(node) = self.get_mut(handle) {
            node.subtree = bound;
            node.dirty = false;
        }

        bound
    }
}

/// An iterator of references to its ancestors.
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    cursor: Option<NodeHandle>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.cursor?;
        self.cursor = self.graph.parent(v);
        Some(v)
    }
}

/// An iterator of references to its children.
pub struct Children<'a> {
    graph: &'a SceneGraph,
    cursor: Option<NodeHandle>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.cursor?;
        self.cursor = self.graph.get(v).and_then(|n| n.next_sib);
        Some(v)
    }
}

/// An iterator of references to its descendants, in tree order.
pub struct Descendants<'a> {
    graph: &'a SceneGraph,
    root: NodeHandle,
    cursor: Option<NodeHandle>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        let mut v = self.graph.get(current)?;

        // Deep first search when iterating children recursively.
        if v.first_child.is_some() {
            self.cursor = v.first_child;
            return Some(current);
        }

        if v.next_sib.is_some() {
            self.cursor = v.next_sib;
            return Some(current);
        }

        // Travel back when we reach leaf-node.
        self.cursor = None;
        while let Some(parent) = v.parent {
            if parent == self.root {
                break;
            }

            match self.graph.get(parent) {
                Some(p) => v = p,
                None => break,
            }

            if v.next_sib.is_some() {
                self.cursor = v.next_sib;
                break;
            }
        }

        Some(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::aabb::Aabb3;
    use crate::scene::node::Renderable;
    use cgmath::InnerSpace;
    use cgmath::{Point3, Vector3};

    fn build(n: u32) -> (SceneGraph, Vec<NodeHandle>) {
        let mut graph = SceneGraph::new();
        let handles: Vec<NodeHandle> = (0..n).map(|i| Handle::new(i, 1).into()).collect();
        for &v in &handles {
            graph.apply(&ChangeRecord::new(v, Change::Create)).unwrap();
        }

        (graph, handles)
    }

    fn parent(graph: &mut SceneGraph, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        graph.apply(&ChangeRecord::new(child, Change::SetParent(Some(parent))))
    }

    #[test]
    fn hierachy() {
        let (mut graph, e) = build(4);
        parent(&mut graph, e[3], e[2]).unwrap();
        parent(&mut graph, e[2], e[0]).unwrap();
        parent(&mut graph, e[1], e[0]).unwrap();
        // e0 <- (e2 <- (e3), e1)

        assert!(graph.is_ancestor(e[1], e[0]));
        assert!(graph.is_ancestor(e[3], e[0]));
        assert!(graph.is_ancestor(e[3], e[2]));
        assert!(!graph.is_ancestor(e[0], e[0]));
        assert!(!graph.is_ancestor(e[1], e[3]));

        assert!(graph.is_root(e[0]));
        assert!(!graph.is_root(e[1]));
        assert!(graph.is_leaf(e[3]));
        assert!(!graph.is_leaf(e[2]));

        let children: Vec<_> = graph.children(e[0]).collect();
        assert_eq!(children, vec![e[2], e[1]]);

        let descendants: Vec<_> = graph.descendants(e[0]).collect();
        assert_eq!(descendants, vec![e[2], e[3], e[1]]);

        let descendants: Vec<_> = graph.descendants(e[2]).collect();
        assert_eq!(descendants, vec![e[3]]);

        let roots: Vec<_> = graph.roots().cloned().collect();
        assert_eq!(roots, vec![e[0]]);
    }

    #[test]
    fn cyclic() {
        let (mut graph, e) = build(3);
        parent(&mut graph, e[1], e[0]).unwrap();
        parent(&mut graph, e[2], e[1]).unwrap();

        assert_eq!(
            parent(&mut graph, e[0], e[2]),
            Err(Error::StructuralViolation {
                child: e[0],
                parent: e[2],
            })
        );

        assert!(parent(&mut graph, e[0], e[0]).is_err());
        assert!(graph.is_root(e[0]));
        assert_eq!(graph.parent(e[2]), Some(e[1]));
    }

    #[test]
    fn reparent() {
        let (mut graph, e) = build(4);
        parent(&mut graph, e[1], e[0]).unwrap();
        parent(&mut graph, e[2], e[0]).unwrap();
        parent(&mut graph, e[3], e[0]).unwrap();

        // Removes the middle one.
        graph
            .apply(&ChangeRecord::new(e[2], Change::SetParent(None)))
            .unwrap();
        assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[1], e[3]]);
        assert!(graph.is_root(e[2]));

        parent(&mut graph, e[2], e[3]).unwrap();
        assert_eq!(graph.descendants(e[0]).collect::<Vec<_>>(), vec![e[1], e[3], e[2]]);

        // Removes the last one.
        graph
            .apply(&ChangeRecord::new(e[3], Change::SetParent(None)))
            .unwrap();
        assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[1]]);

        parent(&mut graph, e[3], e[0]).unwrap();
        assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[1], e[3]]);
    }

    #[test]
    fn destroy() {
        let (mut graph, e) = build(5);
        parent(&mut graph, e[1], e[0]).unwrap();
        parent(&mut graph, e[2], e[1]).unwrap();
        parent(&mut graph, e[3], e[0]).unwrap();

        graph
            .apply(&ChangeRecord::new(e[1], Change::Destroy))
            .unwrap();

        assert_eq!(graph.len(), 3);
        assert!(!graph.contains(e[1]));
        assert!(!graph.contains(e[2]));
        assert_eq!(graph.children(e[0]).collect::<Vec<_>>(), vec![e[3]]);

        assert_eq!(
            graph.apply(&ChangeRecord::new(e[2], Change::DetachStates)),
            Err(Error::NodeInvalid(e[2]))
        );

        // Stale versions are rejected as well.
        let stale: NodeHandle = Handle::new(4, 3).into();
        assert!(graph.apply(&ChangeRecord::new(stale, Change::Destroy)).is_err());
        assert!(graph.apply(&ChangeRecord::new(e[4], Change::Create)).is_err());
    }

    #[test]
    fn world_transform() {
        let (mut graph, e) = build(2);
        parent(&mut graph, e[1], e[0]).unwrap();

        let t = Transform::from_position([1.0f32, 0.0, 2.0]);
        graph
            .apply(&ChangeRecord::new(e[0], Change::Transform(t)))
            .unwrap();
        graph
            .apply(&ChangeRecord::new(e[1], Change::Transform(t)))
            .unwrap();

        let w = graph.world_transform(e[1]).unwrap();
        assert!((w.position - Vector3::new(2.0, 0.0, 4.0)).magnitude() < 1e-5);

        let m = graph.world_matrix(e[1]).unwrap();
        assert!((m.w.truncate() - Vector3::new(2.0, 0.0, 4.0)).magnitude() < 1e-5);
    }

    #[test]
    fn subtree_bounds() {
        let (mut graph, e) = build(3);
        parent(&mut graph, e[1], e[0]).unwrap();
        parent(&mut graph, e[2], e[1]).unwrap();

        let unit = Aabb3::from_center(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        graph
            .apply(&ChangeRecord::new(e[2], Change::Bounds(Some(unit))))
            .unwrap();
        graph
            .apply(&ChangeRecord::new(e[2], Change::AttachState(Renderable::default())))
            .unwrap();
        let t = Transform::from_position([10.0f32, 0.0, 0.0]);
        graph
            .apply(&ChangeRecord::new(e[1], Change::Transform(t)))
            .unwrap();

        graph.refresh_bounds();
        assert!(!graph.get(e[0]).unwrap().is_dirty());

        match graph.get(e[0]).unwrap().subtree_bound() {
            Bound::Finite(v) => {
                assert!((v.min.x - 9.0).abs() < 1e-5);
                assert!((v.max.x - 11.0).abs() < 1e-5);
            }
            v => panic!("unexpected {:?}", v),
        }

        // A renderable without bounds makes the whole chain unbounded.
        graph
            .apply(&ChangeRecord::new(e[2], Change::Bounds(None)))
            .unwrap();
        assert!(graph.get(e[0]).unwrap().is_dirty());
        graph.refresh_bounds();
        assert_eq!(graph.get(e[0]).unwrap().subtree_bound(), Bound::Infinite);
    }
}
