use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A pair of buffers. Readers only ever see the front buffer, writers only ever touch
/// the back one, and `swap` is the sole point where they meet.
#[derive(Debug)]
pub struct DoubleBuf<T> {
    back: RwLock<T>,
    front: RwLock<T>,
}

impl<T: Default> Default for DoubleBuf<T> {
    fn default() -> Self {
        DoubleBuf {
            back: RwLock::new(Default::default()),
            front: RwLock::new(Default::default()),
        }
    }
}

impl<T> DoubleBuf<T> {
    #[inline]
    pub fn new(back: T, front: T) -> Self {
        DoubleBuf {
            back: RwLock::new(back),
            front: RwLock::new(front),
        }
    }

    #[inline]
    pub fn write_back_buf(&self) -> RwLockWriteGuard<T> {
        self.back.write().unwrap()
    }

    #[inline]
    pub fn read_front_buf(&self) -> RwLockReadGuard<T> {
        self.front.read().unwrap()
    }

    /// Swaps the buffers, blocks until every outstanding read guard of the front
    /// buffer has been released.
    #[inline]
    pub fn swap(&self) {
        self.swap_with(|_, _| {});
    }

    /// Swaps the buffers, and calls `func` with (new front, new back) before any
    /// reader could observe the new front buffer.
    pub fn swap_with<F: FnOnce(&mut T, &mut T)>(&self, func: F) {
        let mut back = self.back.write().unwrap();
        let mut front = self.front.write().unwrap();
        ::std::mem::swap::<T>(&mut back, &mut front);
        func(&mut front, &mut back);
    }
}
