use std::sync::Arc;

use crate::errors::*;
use crate::math::frustum::Frustum;
use crate::scene::update::{SyncReport, UpdateManager};
use crate::settings::RendererSettings;
use crate::video::backends::Visitor;

use super::cull;
use super::draw::{DrawReport, DrawStage};
use super::queue::CommandQueue;

/// What happened during a frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameDiagnostics {
    /// The generation of graph that has been drawn.
    pub generation: u64,
    pub changes_applied: usize,
    pub visited_nodes: usize,
    pub culled_subtrees: usize,
    pub queue_len: usize,
    pub draw_calls: usize,
    pub primitives: usize,
    pub native_calls_issued: usize,
    pub native_calls_suppressed: usize,
    pub errors: Vec<Error>,
    pub aborted: bool,
}

impl FrameDiagnostics {
    fn new(sync: SyncReport, queue: &CommandQueue, draw: DrawReport, generation: u64) -> Self {
        let stats = queue.stats();
        FrameDiagnostics {
            generation,
            changes_applied: sync.applied,
            visited_nodes: stats.visited,
            culled_subtrees: stats.culled,
            queue_len: queue.len(),
            draw_calls: draw.draw_calls,
            primitives: draw.primitives,
            native_calls_issued: draw.issued,
            native_calls_suppressed: draw.suppressed,
            errors: draw.errors,
            aborted: draw.aborted,
        }
    }
}

/// The render side of engine. It owns the state cache and the native binding, and
/// reads the active scene graph that `UpdateManager` publishes.
pub struct Renderer {
    manager: Arc<UpdateManager>,
    stage: DrawStage,
    settings: RendererSettings,
}

impl Renderer {
    pub fn new(
        manager: Arc<UpdateManager>,
        visitor: Box<dyn Visitor + Send>,
        settings: RendererSettings,
    ) -> Self {
        info!("Setup renderer with {:#?}.", settings);

        Renderer {
            manager,
            stage: DrawStage::new(visitor, settings.max_texture_units, settings.verify_cache),
            settings,
        }
    }

    #[inline]
    pub fn manager(&self) -> &Arc<UpdateManager> {
        &self.manager
    }

    #[inline]
    pub fn stage(&self) -> &DrawStage {
        &self.stage
    }

    #[inline]
    pub fn stage_mut(&mut self) -> &mut DrawStage {
        &mut self.stage
    }

    /// Publishes pending changes, then draws the active graph.
    pub fn synchronize_and_draw(&mut self, frustum: &Frustum) -> Result<FrameDiagnostics> {
        let sync = self.manager.synchronize()?;
        Ok(self.draw_with(sync, frustum))
    }

    /// Draws the active graph without publishing anything. This is what a render
    /// thread does when another thread drives `synchronize`.
    pub fn draw_active(&mut self, frustum: &Frustum) -> FrameDiagnostics {
        self.draw_with(SyncReport::default(), frustum)
    }

    fn draw_with(&mut self, sync: SyncReport, frustum: &Frustum) -> FrameDiagnostics {
        // The active graph is released once the queue has been built, the queue owns
        // everything that the draw stage needs.
        let (queue, generation) = {
            let active = self.manager.active();
            let queue = cull::build_queue(&active, frustum, self.settings.queue_capacity);
            (queue, active.generation())
        };

        let report = self.stage.draw(&queue);
        FrameDiagnostics::new(sync, &queue, report, generation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::node::Renderable;
    use crate::scene::scene::Scene;
    use crate::video::backends::headless::HeadlessVisitor;

    #[test]
    fn frame() {
        let manager = Arc::new(UpdateManager::default());
        let scene = Scene::new(manager.clone());
        let visitor = HeadlessVisitor::new();
        let mut renderer = Renderer::new(
            manager,
            Box::new(visitor.clone()),
            RendererSettings::default(),
        );

        let e1 = scene.create_node().unwrap();
        scene.attach_state(e1, Renderable::default()).unwrap();

        // Nothing is visible before synchronization.
        let diagnostics = renderer.draw_active(&Frustum::unbounded());
        assert_eq!(diagnostics.generation, 0);
        assert_eq!(diagnostics.draw_calls, 0);

        let diagnostics = renderer.synchronize_and_draw(&Frustum::unbounded()).unwrap();
        assert_eq!(diagnostics.generation, 1);
        assert_eq!(diagnostics.changes_applied, 2);
        assert_eq!(diagnostics.visited_nodes, 1);
        assert_eq!(diagnostics.queue_len, 1);
        assert_eq!(diagnostics.draw_calls, 1);
        assert!(!diagnostics.aborted);

        // Nothing changed, every state call is suppressed.
        let diagnostics = renderer.synchronize_and_draw(&Frustum::unbounded()).unwrap();
        assert_eq!(diagnostics.changes_applied, 0);
        assert_eq!(diagnostics.native_calls_issued, 0);
        assert_eq!(diagnostics.draw_calls, 1);
        assert_eq!(visitor.count(|v| v.is_draw()), 2);
    }
}
