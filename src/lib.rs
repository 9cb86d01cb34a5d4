//! # What is This?
//!
//! Trellis is the core of a retained-mode 3D renderer that sits on top of an
//! OpenGL-family graphics API. It is made of three cooperating parts:
//!
//! 1. A scene graph that the application mutates freely on its own thread. Every
//! mutation becomes a `ChangeRecord` in a pending set, and the `UpdateManager`
//! publishes a whole batch at once by swapping a double-buffered graph.
//!
//! 2. A cull/sort stage that walks the published graph, throws away subtrees that
//! are outside of the view volume, and produces an ordered `CommandQueue` of
//! state `Snapshot`s (opaque first, then blended in traversal order).
//!
//! 3. A draw stage that replays the queue against a narrow native binding, the
//! `Visitor`, through a `StateCache` that never issues a call for state that is
//! already in effect.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trellis::prelude::*;
//!
//! let manager = Arc::new(UpdateManager::new(SceneSettings::default()));
//! let scene = Scene::new(manager.clone());
//!
//! let node = scene.create_node().unwrap();
//! scene.attach_state(node, Renderable::default()).unwrap();
//!
//! let visitor = HeadlessVisitor::new();
//! let mut renderer = Renderer::new(manager, Box::new(visitor), RendererSettings::default());
//!
//! let camera = Transform::from_position([0.0f32, 0.0, -10.0]);
//! let view = camera.frustum(Projection::ortho(10.0, 10.0, 0.1, 100.0));
//! let diagnostics = renderer.synchronize_and_draw(&view).unwrap();
//! println!("{:?}", diagnostics);
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub extern crate cgmath;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod video;

pub mod prelude {
    pub use crate::errors::{Error, Result};
    pub use crate::math::prelude::*;
    pub use crate::renderer::prelude::*;
    pub use crate::scene::prelude::*;
    pub use crate::settings::{RendererSettings, SceneSettings};
    pub use crate::utils::prelude::*;
    pub use crate::video::prelude::*;
}
