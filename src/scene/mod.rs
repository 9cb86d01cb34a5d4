//! A hierarchical scene graph that is mutated on application thread and traversed
//! on render thread.
//!
//! Mutations go through `Scene`, which records them as `ChangeRecord`s. The
//! `UpdateManager` publishes recorded batches atomically with `synchronize`, and
//! the render thread reads the published graph through `UpdateManager::active`.

pub mod change;
pub mod graph;
pub mod node;
pub mod scene;
pub mod transform;
pub mod update;

pub use self::change::{Change, ChangeKind, ChangeRecord};
pub use self::graph::SceneGraph;
pub use self::node::{Bound, Node, NodeHandle, Renderable};
pub use self::scene::Scene;
pub use self::transform::Transform;
pub use self::update::{ActiveGraph, SyncReport, UpdateManager};

pub mod prelude {
    pub use super::{NodeHandle, Renderable, Scene, SceneGraph, Transform, UpdateManager};
}
