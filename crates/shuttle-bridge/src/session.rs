//! Mount/unmount glue for one UI session.
//!
//! `mount` runs initialize, create and register in order; `unmount` releases.
//! Unmount is valid at any point, including while `mount` is still waiting on
//! the runtime to load. The session releases on drop as well, so every exit
//! path frees the core.

use crate::bridge::{DispatchBridge, Subscription};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::host::HostShell;
use crate::lifecycle::{LifecycleManager, LifecycleState};
use crate::runtime::EditorRuntime;

/// Result of a successful [`EditorSession::mount`].
#[derive(Debug)]
pub enum MountOutcome {
    /// The core is live and the bridge is subscribed.
    Mounted(Subscription),
    /// The session was unmounted before the core finished loading.
    Abandoned,
}

impl MountOutcome {
    pub fn into_subscription(self) -> Option<Subscription> {
        match self {
            MountOutcome::Mounted(subscription) => Some(subscription),
            MountOutcome::Abandoned => None,
        }
    }
}

pub struct EditorSession<R: EditorRuntime, H> {
    lifecycle: LifecycleManager<R>,
    bridge: DispatchBridge<H>,
}

impl<R: EditorRuntime, H: HostShell + 'static> EditorSession<R, H> {
    pub fn new(runtime: R, host: H, config: &BridgeConfig) -> Self {
        Self {
            lifecycle: LifecycleManager::with_config(runtime, config),
            bridge: DispatchBridge::new(host),
        }
    }

    pub fn lifecycle(&self) -> &LifecycleManager<R> {
        &self.lifecycle
    }

    pub fn bridge(&self) -> &DispatchBridge<H> {
        &self.bridge
    }

    /// Bring the core up and subscribe the bridge to it.
    ///
    /// Only initialization failure is returned to the caller as fatal.
    pub async fn mount(&self) -> Result<MountOutcome> {
        if self.lifecycle.state() != LifecycleState::Released {
            self.lifecycle.initialize().await?;
        }
        if self.lifecycle.state() == LifecycleState::Released {
            tracing::info!("session unmounted before the core was ready");
            return Ok(MountOutcome::Abandoned);
        }

        let handle = self.lifecycle.create_instance()?;
        match self.bridge.register(&handle) {
            Ok(subscription) => Ok(MountOutcome::Mounted(subscription)),
            Err(err) => {
                self.lifecycle.release_instance();
                Err(err)
            }
        }
    }

    /// Release the core. Idempotent.
    pub fn unmount(&self) {
        self.lifecycle.release_instance();
    }
}
