//! Lifecycle and event dispatch bridge for an embedded editor core.
//!
//! The editor core is an opaque, compiled engine. This crate sits between it
//! and the host shell that owns window-level side effects:
//!
//! - `lifecycle`: initializes the core runtime, owns the single live
//!   [`CoreHandle`], and releases it exactly once.
//! - `channel`: per-kind FIFO queues carrying events from the core.
//! - `bridge`: subscribes to those queues and performs host side effects.
//! - `sink`: the process-wide inbound entry point for out-of-band messages.
//! - `session`: mount/unmount glue composing the pieces above.
//!
//! Everything here is single-threaded and cooperative. Types hold `Rc`s and
//! are deliberately `!Send`.

pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod handle;
pub mod host;
pub mod lifecycle;
pub mod runtime;
pub mod session;
pub mod sink;

pub use bridge::{DispatchBridge, DispatchReport, Subscription};
pub use channel::{EventEmitter, EventStreams, InboundEvent};
pub use config::BridgeConfig;
pub use error::{BridgeError, HostError, PayloadError, Result, RuntimeError};
pub use events::{EditorEvent, EventKind};
pub use handle::{CoreHandle, HandleRef};
pub use host::HostShell;
pub use lifecycle::{LifecycleManager, LifecycleState};
pub use runtime::{CoreInstance, EditorRuntime};
pub use session::{EditorSession, MountOutcome};
pub use sink::{SinkDelivery, SinkRegistration};
