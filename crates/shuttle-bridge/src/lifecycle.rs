//! Core lifecycle manager.
//!
//! Owns the session's single [`CoreHandle`] and walks it through
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> Released
//!                        |
//!                        +-> Failed
//! ```
//!
//! `Released` and `Failed` are terminal. A release that arrives while the
//! runtime is still loading moves straight to `Released`; the load result is
//! discarded when it resolves and no instance is ever created.
//!
//! Availability is published on a watch channel so the rendering layer can
//! mount exactly while a handle is alive.

use std::cell::RefCell;
use std::fmt;

use smol_str::SmolStr;
use tokio::sync::watch;

use crate::channel::event_channels;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::handle::{CoreHandle, HandleRef, Liveness};
use crate::runtime::{CoreInstance, EditorRuntime};
use crate::sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Released,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Failed | LifecycleState::Released)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::Failed => "failed",
            LifecycleState::Released => "released",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published to watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStatus {
    pub state: LifecycleState,
    /// Id of the live core handle, if one exists.
    pub live_handle: Option<u64>,
}

impl LifecycleStatus {
    /// The rendering layer mounts iff this is true.
    pub fn is_renderable(&self) -> bool {
        self.state == LifecycleState::Ready && self.live_handle.is_some()
    }
}

pub struct LifecycleManager<R: EditorRuntime> {
    runtime: R,
    sink_name: SmolStr,
    status: watch::Sender<LifecycleStatus>,
    handle: RefCell<Option<CoreHandle<R::Instance>>>,
}

impl<R: EditorRuntime> LifecycleManager<R> {
    pub fn new(runtime: R) -> Self {
        Self::with_config(runtime, &BridgeConfig::default())
    }

    pub fn with_config(runtime: R, config: &BridgeConfig) -> Self {
        let (status, _) = watch::channel(LifecycleStatus {
            state: LifecycleState::Uninitialized,
            live_handle: None,
        });
        Self {
            runtime,
            sink_name: config.sink_name.clone(),
            status,
            handle: RefCell::new(None),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn state(&self) -> LifecycleState {
        self.status.borrow().state
    }

    pub fn status(&self) -> LifecycleStatus {
        *self.status.borrow()
    }

    /// Subscribe to availability changes.
    pub fn watch(&self) -> watch::Receiver<LifecycleStatus> {
        self.status.subscribe()
    }

    pub fn is_renderable(&self) -> bool {
        self.status().is_renderable()
    }

    /// Non-owning reference to the live handle, if any.
    pub fn handle(&self) -> Option<HandleRef<R::Instance>> {
        self.handle
            .borrow()
            .as_ref()
            .filter(|handle| handle.is_alive())
            .map(CoreHandle::downgrade)
    }

    fn publish(&self, state: LifecycleState, live_handle: Option<u64>) {
        let previous = self.status.send_replace(LifecycleStatus { state, live_handle });
        if previous.state != state {
            tracing::debug!(from = %previous.state, to = %state, "core lifecycle transition");
        }
    }

    /// Load the core runtime. Fails fast; a failure is fatal to the session.
    pub async fn initialize(&self) -> Result<()> {
        let state = self.state();
        if state != LifecycleState::Uninitialized {
            return Err(BridgeError::InvalidState {
                operation: "initialize the core",
                state,
            });
        }
        self.publish(LifecycleState::Initializing, None);

        let loaded = self.runtime.load().await;

        if self.state() == LifecycleState::Released {
            tracing::debug!(
                ok = loaded.is_ok(),
                "core finished loading after release; discarding"
            );
            return Ok(());
        }

        match loaded {
            Ok(()) => {
                self.publish(LifecycleState::Ready, None);
                tracing::info!("core runtime initialized");
                Ok(())
            }
            Err(err) => {
                self.publish(LifecycleState::Failed, None);
                tracing::error!(%err, "core runtime failed to initialize");
                Err(BridgeError::Initialization(err))
            }
        }
    }

    /// Construct the session's core instance and install the global sink.
    pub fn create_instance(&self) -> Result<HandleRef<R::Instance>> {
        let state = self.state();
        if state != LifecycleState::Ready {
            return Err(BridgeError::InvalidState {
                operation: "create an instance",
                state,
            });
        }
        if self.handle.borrow().is_some() {
            return Err(BridgeError::InstanceAlreadyLive);
        }

        let liveness = Liveness::new();
        let (emitter, streams) = event_channels(liveness.clone());
        let instance = self
            .runtime
            .instantiate(emitter)
            .map_err(BridgeError::Instantiation)?;
        let handle = CoreHandle::new(instance, liveness, streams);

        let target = handle.downgrade();
        let registration = match sink::install(self.sink_name.clone(), move |message| {
            target
                .with_instance(|instance| instance.push_message(message))
                .is_some()
        }) {
            Ok(registration) => registration,
            Err(err) => {
                if let Err(free_err) = handle.release() {
                    tracing::warn!(%free_err, "failed to free core instance after sink error");
                }
                return Err(err);
            }
        };
        handle.attach_sink(registration);

        let handle_ref = handle.downgrade();
        let id = handle.id();
        *self.handle.borrow_mut() = Some(handle);
        self.publish(LifecycleState::Ready, Some(id));
        tracing::info!(handle = id, sink = %self.sink_name, "core instance created");
        Ok(handle_ref)
    }

    /// Release the core instance. Exactly once; later calls are no-ops.
    ///
    /// Safe in every state. Before the core is ready this only marks the
    /// session released.
    pub fn release_instance(&self) {
        let state = self.state();
        if state.is_terminal() {
            return;
        }
        // Watchers unmount before the handle goes away.
        self.publish(LifecycleState::Released, None);

        let Some(handle) = self.handle.borrow_mut().take() else {
            tracing::debug!(from = %state, "released before a core instance existed");
            return;
        };
        let id = handle.id();
        match handle.release() {
            Ok(()) => tracing::info!(handle = id, "core instance released"),
            Err(err) => tracing::warn!(handle = id, %err, "core instance failed to free; marked released"),
        }
    }
}

impl<R: EditorRuntime> Drop for LifecycleManager<R> {
    fn drop(&mut self) {
        self.release_instance();
    }
}

impl<R: EditorRuntime> fmt::Debug for LifecycleManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("status", &self.status())
            .field("sink_name", &self.sink_name)
            .finish_non_exhaustive()
    }
}
