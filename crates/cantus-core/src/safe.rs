//! Deferred destruction of objects shared with the audio thread.
//!
//! The audio thread must never free memory. Objects it can see are owned by a
//! [`SafeOwner`]; when the owner is dropped or reassigned the object is moved
//! into a [`DeletionQueue`] instead of being freed. The node manager clears the
//! queue at the start of every device callback, before any node runs, so no
//! [`SafePtr`] upgraded during the previous callback can still be in use.
//!
//! Observers hold a [`SafePtr`], a weak reference that resolves to `None` once
//! the object has actually been released.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::{Arc, Weak};

type Garbage = Box<dyn Send>;

struct QueueInner {
    tx: Sender<Garbage>,
    rx: Receiver<Garbage>,
}

/// Thread-safe FIFO of objects waiting to be dropped.
#[derive(Clone)]
pub struct DeletionQueue {
    inner: Arc<QueueInner>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            inner: Arc::new(QueueInner { tx, rx }),
        }
    }

    /// Takes ownership of `value`; it is dropped on the next [`clear`](Self::clear).
    pub fn enqueue<T: Send + 'static>(&self, value: T) {
        // Both ends live in `inner`, so the send cannot fail.
        let _ = self.inner.tx.send(Box::new(value));
    }

    /// Drops everything enqueued so far. Returns the number of objects released.
    pub fn clear(&self) -> usize {
        let mut released = 0;
        while let Ok(garbage) = self.inner.rx.try_recv() {
            drop(garbage);
            released += 1;
        }
        released
    }

    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }
}

impl Default for DeletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeletionQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Exclusive owner of an object that the audio thread may observe.
pub struct SafeOwner<T: Send + Sync + 'static> {
    object: Option<Arc<T>>,
    queue: Option<DeletionQueue>,
}

impl<T: Send + Sync + 'static> SafeOwner<T> {
    pub fn new(queue: &DeletionQueue, value: T) -> Self {
        Self {
            object: Some(Arc::new(value)),
            queue: Some(queue.clone()),
        }
    }

    /// An owner holding nothing.
    pub fn null() -> Self {
        Self {
            object: None,
            queue: None,
        }
    }

    /// Returns an observer of the current object.
    pub fn get_safe(&self) -> SafePtr<T> {
        SafePtr {
            object: self.object.as_ref().map(Arc::downgrade).unwrap_or_default(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.object.as_deref()
    }

    /// Mutable access, available only while no observer holds an upgraded reference.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.object.as_mut().and_then(Arc::get_mut)
    }

    pub fn is_null(&self) -> bool {
        self.object.is_none()
    }

    /// Takes over `other`'s object. The previous object goes to the deletion queue.
    pub fn replace(&mut self, other: SafeOwner<T>) {
        *self = other;
    }

    /// Releases the current object to the deletion queue.
    pub fn reset(&mut self) {
        if let Some(object) = self.object.take() {
            match &self.queue {
                Some(queue) => queue.enqueue(object),
                None => drop(object),
            }
        }
    }
}

impl<T: Send + Sync + 'static> Default for SafeOwner<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Send + Sync + 'static> Drop for SafeOwner<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: Send + Sync + fmt::Debug + 'static> fmt::Debug for SafeOwner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SafeOwner").field(&self.object).finish()
    }
}

/// Non-owning observer of an object held by a [`SafeOwner`].
pub struct SafePtr<T> {
    object: Weak<T>,
}

impl<T> SafePtr<T> {
    pub fn null() -> Self {
        Self {
            object: Weak::new(),
        }
    }

    /// Resolves the observed object, or `None` once it has been released.
    #[inline]
    pub fn get(&self) -> Option<Arc<T>> {
        self.object.upgrade()
    }

    pub fn is_null(&self) -> bool {
        self.object.strong_count() == 0
    }

    pub fn ptr_eq(&self, other: &SafePtr<T>) -> bool {
        self.object.ptr_eq(&other.object)
    }
}

impl<T> Clone for SafePtr<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
        }
    }
}

impl<T> Default for SafePtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Debug for SafePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafePtr")
            .field("live", &!self.is_null())
            .finish()
    }
}
