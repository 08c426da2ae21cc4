//! Event dispatch bridge.
//!
//! Registers one handler per [`EventKind`] against a live core handle and
//! turns each event into a single host side effect:
//!
//! | kind               | target opened          |
//! |--------------------|------------------------|
//! | `VisitLink`        | the url, as given      |
//! | `OpenEmbeddedFile` | `"/"` + the path       |
//!
//! Handlers never fail outward. Host errors (a blocked popup) are logged and
//! dropped, never retried; malformed payloads are discarded with a warning.

use std::fmt;
use std::rc::Rc;

use n0_future::FutureExt;

use crate::channel::{EventStreams, InboundEvent};
use crate::error::{BridgeError, HostError, Result};
use crate::events::{EditorEvent, EventKind};
use crate::handle::{HandleRef, Liveness};
use crate::host::HostShell;

type Handler = Box<dyn Fn(&EditorEvent) -> Result<(), HostError>>;

/// Tally of what a dispatch pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked and the host accepted the target.
    pub dispatched: usize,
    /// Handlers invoked but the host refused or failed.
    pub host_failures: usize,
    /// Payloads that could not be decoded.
    pub malformed: usize,
    /// Events dropped because the handle was already released.
    pub discarded: usize,
}

impl DispatchReport {
    /// Number of handler invocations, successful or not.
    pub fn handled(&self) -> usize {
        self.dispatched + self.host_failures
    }
}

pub struct DispatchBridge<H> {
    host: Rc<H>,
}

impl<H: HostShell + 'static> DispatchBridge<H> {
    pub fn new(host: H) -> Self {
        Self {
            host: Rc::new(host),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Subscribe to the handle's event queues.
    ///
    /// The handle must be alive, and each handle accepts one subscription.
    pub fn register<I>(&self, handle: &HandleRef<I>) -> Result<Subscription> {
        let liveness = handle.liveness().ok_or(BridgeError::NotReady)?;
        let streams = handle.take_streams()?;

        let handlers = EventKind::ALL.map(|kind| self.handler_for(kind));
        tracing::debug!(handle = handle.id(), "dispatch bridge subscribed");

        Ok(Subscription {
            handle_id: handle.id(),
            liveness,
            streams,
            handlers,
        })
    }

    fn handler_for(&self, kind: EventKind) -> Handler {
        let host = self.host.clone();
        match kind {
            EventKind::VisitLink => Box::new(move |event: &EditorEvent| match event {
                EditorEvent::VisitLink { url } => host.open_new_context(url),
                other => unroutable(kind, other),
            }),
            EventKind::OpenEmbeddedFile => Box::new(move |event: &EditorEvent| match event {
                EditorEvent::OpenEmbeddedFile { .. } => host.open_new_context(&event.target()),
                other => unroutable(kind, other),
            }),
        }
    }
}

// Queues are keyed by kind, so this only fires on a routing bug.
fn unroutable(kind: EventKind, event: &EditorEvent) -> Result<(), HostError> {
    tracing::warn!(%kind, got = %event.kind(), "event routed to the wrong handler; ignoring");
    Ok(())
}

impl<H> fmt::Debug for DispatchBridge<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchBridge").finish_non_exhaustive()
    }
}

/// The bridge's registration against one core handle.
///
/// Invalidated implicitly when the handle is released: pending and future
/// events are discarded rather than dispatched.
pub struct Subscription {
    handle_id: u64,
    liveness: Liveness,
    streams: EventStreams,
    handlers: [Handler; 2],
}

impl Subscription {
    pub fn handle_id(&self) -> u64 {
        self.handle_id
    }

    /// Whether the owning handle is still alive.
    pub fn is_active(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Drain every queue, oldest first within each kind.
    pub fn dispatch_pending(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        for kind in EventKind::ALL {
            while let Some(inbound) = self.streams.try_next(kind) {
                self.dispatch(inbound, &mut report);
            }
        }
        report
    }

    /// Dispatch events as they arrive until the handle is released or the
    /// core drops its emitter.
    pub async fn run(mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        while self.liveness.is_alive() {
            let liveness = &self.liveness;
            let released = async {
                liveness.released().await;
                None
            };
            let Some(inbound) = self.streams.next().race(released).await else {
                break;
            };
            self.dispatch(inbound, &mut report);
        }
        // Whatever is still queued was emitted for a core that is gone.
        report.discarded += self.drain_discarded();
        tracing::debug!(handle = self.handle_id, ?report, "dispatch loop finished");
        report
    }

    fn drain_discarded(&mut self) -> usize {
        let mut dropped = 0;
        for kind in EventKind::ALL {
            while self.streams.try_next(kind).is_some() {
                dropped += 1;
            }
        }
        dropped
    }

    fn dispatch(&self, inbound: InboundEvent, report: &mut DispatchReport) {
        let kind = inbound.kind();
        if !self.liveness.is_alive() {
            tracing::trace!(handle = self.handle_id, %kind, "handle released; discarding event");
            report.discarded += 1;
            return;
        }

        let event = match inbound.into_event() {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(handle = self.handle_id, %err, "discarding malformed event");
                report.malformed += 1;
                return;
            }
        };

        match (self.handlers[kind.index()])(&event) {
            Ok(()) => {
                tracing::debug!(handle = self.handle_id, %kind, "event dispatched");
                report.dispatched += 1;
            }
            Err(err) => {
                tracing::debug!(handle = self.handle_id, %kind, %err, "host did not open target");
                report.host_failures += 1;
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handle_id", &self.handle_id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
