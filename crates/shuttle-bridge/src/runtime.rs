//! The opaque editor core, seen from the bridge.
//!
//! The core is consumed as a black box: it loads asynchronously, produces
//! instances that emit events through an [`EventEmitter`], accepts
//! out-of-band messages, and must be freed explicitly.

use std::future::Future;

use crate::channel::EventEmitter;
use crate::error::RuntimeError;

/// Loader and factory for core instances.
///
/// Methods take `&self` so a pending `load` never holds an exclusive borrow
/// that an unmount would need.
pub trait EditorRuntime {
    type Instance: CoreInstance + 'static;

    /// Establish runtime preconditions (e.g. fetch and compile the core's
    /// module). Called at most once per session.
    fn load(&self) -> impl Future<Output = Result<(), RuntimeError>>;

    /// Construct an instance. The emitter is the instance's only way to
    /// publish events.
    fn instantiate(&self, emitter: EventEmitter) -> Result<Self::Instance, RuntimeError>;
}

/// A live core instance.
pub trait CoreInstance {
    /// Accept a message the host pushed through the global sink.
    fn push_message(&self, message: &str);

    /// Free the underlying resources. Called exactly once.
    fn free(&mut self) -> Result<(), RuntimeError>;
}
