//! The render-command pipeline.
//!
//! Every frame, the cull stage walks the active scene graph and collects the
//! visible renderables into a `CommandQueue`. The queue is sorted by opacity and
//! pipeline state, and the draw stage replays it against a `Visitor` through a
//! `StateCache`, which drops every native call whose state is already in effect.

pub mod cache;
pub mod cull;
pub mod draw;
pub mod frame;
pub mod queue;

pub use self::cache::{CacheStats, StateAxis, StateCache};
pub use self::cull::build_queue;
pub use self::draw::{DrawReport, DrawStage};
pub use self::frame::{FrameDiagnostics, Renderer};
pub use self::queue::{CommandQueue, CullStats, QueueBuilder, QueueEntry};

pub mod prelude {
    pub use super::{CommandQueue, FrameDiagnostics, Renderer, StateCache};
}
