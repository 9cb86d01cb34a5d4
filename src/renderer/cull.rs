use cgmath::Matrix4;
use cgmath::SquareMatrix;

use crate::math::frustum::Frustum;
use crate::math::plane::PlaneRelation;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{Bound, NodeHandle};

use super::queue::{CommandQueue, QueueBuilder};

/// Walks the graph depth-first and collects the renderables that might be visible
/// from `frustum`.
///
/// Roots are visited in handle order, and children in sibling order, so the
/// traversal order is deterministic for the same graph. A subtree is skipped only if
/// its bounds are completely outside of the frustum.
pub fn build_queue(graph: &SceneGraph, frustum: &Frustum, capacity: usize) -> CommandQueue {
    let mut builder = QueueBuilder::with_capacity(capacity);
    let identity = Matrix4::identity();

    for &root in graph.roots() {
        visit(graph, frustum, root, &identity, &mut builder);
    }

    builder.build()
}

fn visit(
    graph: &SceneGraph,
    frustum: &Frustum,
    handle: NodeHandle,
    parent: &Matrix4<f32>,
    builder: &mut QueueBuilder,
) {
    let node = match graph.get(handle) {
        Some(node) => node,
        None => return,
    };

    let world = parent * node.transform().matrix();

    if let Bound::Finite(aabb) = node.subtree_bound().transform(&world) {
        if frustum.contains(&aabb) == PlaneRelation::Out {
            builder.cull();
            return;
        }
    }

    builder.visit();
    for v in node.renderables() {
        builder.push(v.resolve(&world), v.draw);
    }

    for child in graph.children(handle) {
        visit(graph, frustum, child, &world, builder);
    }
}
