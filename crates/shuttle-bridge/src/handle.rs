//! The owned core handle and its non-owning references.
//!
//! `CoreHandle` is held only by the lifecycle manager. Everything else (the
//! dispatch bridge, the global sink, rendering code) gets a [`HandleRef`],
//! which goes dead the moment the handle is released.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

use crate::channel::EventStreams;
use crate::error::{BridgeError, RuntimeError};
use crate::runtime::CoreInstance;
use crate::sink::SinkRegistration;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared alive/released flag for one core handle.
///
/// Cloned into the emitter and the subscription so both can observe release
/// without holding the handle itself.
#[derive(Clone)]
pub(crate) struct Liveness {
    inner: Rc<LivenessInner>,
}

struct LivenessInner {
    alive: Cell<bool>,
    released: Notify,
}

impl Liveness {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(LivenessInner {
                alive: Cell::new(true),
                released: Notify::new(),
            }),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// Flip to released and wake anything parked on [`Liveness::released`].
    /// Returns false if already released.
    fn release(&self) -> bool {
        if !self.inner.alive.replace(false) {
            return false;
        }
        self.inner.released.notify_waiters();
        true
    }

    /// Resolves once the handle is released.
    pub(crate) async fn released(&self) {
        let notified = self.inner.released.notified();
        if !self.is_alive() {
            return;
        }
        notified.await;
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Liveness")
            .field("alive", &self.is_alive())
            .finish()
    }
}

struct HandleInner<I> {
    id: u64,
    liveness: Liveness,
    instance: RefCell<Option<I>>,
    streams: RefCell<Option<EventStreams>>,
    sink: RefCell<Option<SinkRegistration>>,
}

/// The session's single live reference to the editor core.
///
/// Not `Clone`. Dropping it without calling [`CoreHandle::release`] still
/// frees the instance, through `Drop`.
pub struct CoreHandle<I: CoreInstance> {
    inner: Rc<HandleInner<I>>,
}

impl<I: CoreInstance> CoreHandle<I> {
    pub(crate) fn new(instance: I, liveness: Liveness, streams: EventStreams) -> Self {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            inner: Rc::new(HandleInner {
                id,
                liveness,
                instance: RefCell::new(Some(instance)),
                streams: RefCell::new(Some(streams)),
                sink: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_alive(&self) -> bool {
        self.inner.liveness.is_alive()
    }

    /// A non-owning reference for consumers.
    pub fn downgrade(&self) -> HandleRef<I> {
        HandleRef {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn attach_sink(&self, registration: SinkRegistration) {
        *self.inner.sink.borrow_mut() = Some(registration);
    }

    /// Release the core: liveness first, then the sink, then the instance.
    ///
    /// Liveness is flipped even when freeing fails; the error is returned for
    /// logging only. If the instance is currently lent out through
    /// [`HandleRef::with_instance`], it is freed when that call returns.
    pub fn release(self) -> Result<(), RuntimeError> {
        self.release_in_place()
    }

    fn release_in_place(&self) -> Result<(), RuntimeError> {
        if !self.inner.liveness.release() {
            return Ok(());
        }
        if let Some(registration) = self.inner.sink.borrow_mut().take() {
            registration.uninstall();
        }
        // Unsubscribed queues go with the handle.
        self.inner.streams.borrow_mut().take();

        let instance = self.inner.instance.borrow_mut().take();
        match instance {
            Some(mut instance) => instance.free(),
            None => Ok(()),
        }
    }
}

impl<I: CoreInstance> Drop for CoreHandle<I> {
    fn drop(&mut self) {
        if let Err(err) = self.release_in_place() {
            tracing::warn!(handle = self.inner.id, %err, "failed to free core instance on drop");
        }
    }
}

impl<I: CoreInstance> fmt::Debug for CoreHandle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreHandle")
            .field("id", &self.inner.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Non-owning reference to a [`CoreHandle`].
///
/// Valid only while the handle is alive; every accessor checks.
pub struct HandleRef<I> {
    id: u64,
    inner: Weak<HandleInner<I>>,
}

impl<I> Clone for HandleRef<I> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl<I> HandleRef<I> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.liveness.is_alive())
    }

    pub(crate) fn liveness(&self) -> Option<Liveness> {
        let inner = self.inner.upgrade()?;
        inner
            .liveness
            .is_alive()
            .then(|| inner.liveness.clone())
    }

    /// Hand the per-kind queues to their single consumer.
    pub(crate) fn take_streams(&self) -> Result<EventStreams, BridgeError> {
        let inner = self.inner.upgrade().ok_or(BridgeError::NotReady)?;
        if !inner.liveness.is_alive() {
            return Err(BridgeError::NotReady);
        }
        inner
            .streams
            .borrow_mut()
            .take()
            .ok_or(BridgeError::AlreadySubscribed { handle: self.id })
    }
}

impl<I: CoreInstance> HandleRef<I> {
    /// Run `f` against the live instance. `None` once released, or while the
    /// instance is already lent to an outer call.
    ///
    /// The instance is taken out of the handle for the duration of `f`, so
    /// `f` may release the handle. In that case the instance is freed here
    /// once `f` returns.
    pub fn with_instance<T>(&self, f: impl FnOnce(&I) -> T) -> Option<T> {
        let inner = self.inner.upgrade()?;
        if !inner.liveness.is_alive() {
            return None;
        }
        let mut instance = inner.instance.borrow_mut().take()?;
        let out = f(&instance);

        if inner.liveness.is_alive() {
            *inner.instance.borrow_mut() = Some(instance);
        } else {
            match instance.free() {
                Ok(()) => tracing::debug!(handle = inner.id, "core instance freed after reentrant release"),
                Err(err) => tracing::warn!(handle = inner.id, %err, "failed to free core instance after reentrant release"),
            }
        }
        Some(out)
    }
}

impl<I> fmt::Debug for HandleRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
