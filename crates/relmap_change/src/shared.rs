//! Guarded access to collections shared across units of work.
//!
//! A lazily-loaded collection can be shared between concurrent units of
//! work through a second-level cache. The lock lives on the delegate
//! container itself, not on any wrapper, so a mutation through one wrapper
//! reference cannot race a comparison running through another.

use crate::container::Container;
use parking_lot::Mutex;
use std::sync::Arc;

/// A collection container shared between units of work.
///
/// The diff engine never operates on the shared container directly. It
/// takes an owned [`snapshot`](SharedContainer::snapshot) under the lock
/// and diffs that, while mutations go through
/// [`with_mut`](SharedContainer::with_mut), which holds the lock for the
/// whole read-then-mutate sequence.
#[derive(Debug, Clone)]
pub struct SharedContainer {
    delegate: Arc<Mutex<Container>>,
}

impl SharedContainer {
    /// Wraps a container for sharing.
    #[must_use]
    pub fn new(container: Container) -> Self {
        Self {
            delegate: Arc::new(Mutex::new(container)),
        }
    }

    /// Clones the current contents out under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Container {
        self.delegate.lock().clone()
    }

    /// Runs `f` with exclusive access to the underlying container.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Container) -> R) -> R {
        let mut guard = self.delegate.lock();
        f(&mut guard)
    }

    /// Number of elements, read under the lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegate.lock().len()
    }

    /// Returns true if the shared container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
