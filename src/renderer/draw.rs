use crate::errors::*;
use crate::video::backends::call::NativeCall;
use crate::video::backends::{NativeError, Visitor};

use super::cache::StateCache;
use super::queue::CommandQueue;

/// Statistics and errors of a single draw pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawReport {
    pub draw_calls: usize,
    /// The number of points, lines or triangles that have been submitted.
    pub primitives: usize,
    /// Native calls that changed state, draw calls excluded.
    pub issued: usize,
    /// Native calls that were skipped by state cache.
    pub suppressed: usize,
    pub errors: Vec<Error>,
    /// Returns true if the rest of queue has been discarded.
    pub aborted: bool,
}

/// Turns the entries of a `CommandQueue` into native calls through a `StateCache`.
pub struct DrawStage {
    cache: StateCache,
    visitor: Box<dyn Visitor + Send>,
    verify: bool,
    #[cfg(test)]
    corrupt_at: Option<usize>,
}

impl DrawStage {
    pub fn new(visitor: Box<dyn Visitor + Send>, max_texture_units: usize, verify: bool) -> Self {
        DrawStage {
            cache: StateCache::new(max_texture_units),
            visitor,
            verify,
            #[cfg(test)]
            corrupt_at: None,
        }
    }

    #[inline]
    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    #[inline]
    pub fn visitor(&self) -> &dyn Visitor {
        self.visitor.as_ref()
    }

    /// Replaces the native binding, e.g. after the context has been recreated. The
    /// state cache knows nothing about the new binding.
    pub fn replace_visitor(&mut self, visitor: Box<dyn Visitor + Send>) -> Box<dyn Visitor + Send> {
        self.cache.reset();
        ::std::mem::replace(&mut self.visitor, visitor)
    }

    /// Draws the entries in queue order.
    ///
    /// Native errors are collected with the index of entry that raised them, and the
    /// pass goes on. A lost context or a diverged state cache discards the rest of
    /// queue and resets the cache.
    pub fn draw(&mut self, queue: &CommandQueue) -> DrawReport {
        let mut report = DrawReport::default();
        let stats = self.cache.stats();

        // Errors raised before this pass belong to nobody.
        if let Some(err) = self.visitor.last_error() {
            warn!("Discards native error {} raised before draw pass.", err);
        }

        for (i, entry) in queue.iter().enumerate() {
            if let Err(err) = self.cache.apply(self.visitor.as_mut(), &entry.snapshot) {
                let err = Error::SkippedEntry {
                    index: i,
                    cause: Box::new(err),
                };

                warn!("{}", err);
                report.errors.push(err);
                continue;
            }

            #[cfg(test)]
            {
                if self.corrupt_at == Some(i) {
                    self.cache.corrupt();
                }
            }

            if self.verify {
                if let Err(err) = self.cache.verify(&entry.snapshot) {
                    error!("{} Aborts the frame at queue entry {}.", err, i);
                    self.cache.reset();
                    report.errors.push(err);
                    report.aborted = true;
                    break;
                }
            }

            NativeCall::draw(entry.draw).dispatch(self.visitor.as_mut());
            report.draw_calls += 1;
            report.primitives += entry.draw.primitive().assemble(entry.draw.count()) as usize;

            match self.visitor.last_error() {
                Some(NativeError::ContextLost) => {
                    warn!("Context lost at queue entry {}, discards the rest.", i);
                    self.cache.reset();
                    report.errors.push(Error::ContextLost);
                    report.aborted = true;
                    break;
                }
                Some(error) => {
                    warn!("Native call failed at queue entry {}: {}.", i, error);
                    report.errors.push(Error::NativeCall { index: i, error });
                }
                None => {}
            }
        }

        let current = self.cache.stats();
        report.issued = current.issued - stats.issued;
        report.suppressed = current.suppressed - stats.suppressed;
        report
    }
}
