//! Per-kind event queues between the core and the bridge.
//!
//! One unbounded single-consumer queue per [`EventKind`]. The core holds the
//! producing [`EventEmitter`]; the bridge takes the [`EventStreams`] once it
//! subscribes. Anything emitted in between stays queued.

use std::rc::Rc;

use n0_future::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::error::PayloadError;
use crate::events::{EditorEvent, EventKind};
use crate::handle::Liveness;

/// What travels over a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Already decoded by the core.
    Typed(EditorEvent),
    /// Serialized payload, decoded by the bridge at dispatch time.
    Raw { kind: EventKind, payload: String },
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::Typed(event) => event.kind(),
            InboundEvent::Raw { kind, .. } => *kind,
        }
    }

    pub fn into_event(self) -> Result<EditorEvent, PayloadError> {
        match self {
            InboundEvent::Typed(event) => {
                event.validate()?;
                Ok(event)
            }
            InboundEvent::Raw { kind, payload } => EditorEvent::decode(kind, &payload),
        }
    }
}

pub(crate) fn event_channels(liveness: Liveness) -> (EventEmitter, EventStreams) {
    let (links_tx, links_rx) = mpsc::unbounded_channel();
    let (files_tx, files_rx) = mpsc::unbounded_channel();
    let emitter = EventEmitter {
        senders: Rc::new([links_tx, files_tx]),
        liveness,
    };
    let streams = EventStreams {
        receivers: [links_rx, files_rx],
    };
    (emitter, streams)
}

/// Producer side, handed to the core at instantiation.
///
/// Cheap to clone. Emitting after the handle is released is a silent no-op.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    senders: Rc<[UnboundedSender<InboundEvent>; 2]>,
    liveness: Liveness,
}

impl EventEmitter {
    /// Queue a typed event. Returns whether it was accepted.
    pub fn emit(&self, event: EditorEvent) -> bool {
        self.send(InboundEvent::Typed(event))
    }

    /// Queue a serialized payload for the named kind.
    ///
    /// Unknown kinds are dropped here with a warning. Payload shape is checked
    /// by the bridge when the event is dispatched.
    pub fn emit_raw(&self, kind: &str, payload: impl Into<String>) -> bool {
        let kind = match kind.parse::<EventKind>() {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(%err, "dropping event from core");
                return false;
            }
        };
        self.send(InboundEvent::Raw {
            kind,
            payload: payload.into(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.liveness.is_alive()
    }

    fn send(&self, event: InboundEvent) -> bool {
        let kind = event.kind();
        if !self.liveness.is_alive() {
            tracing::debug!(%kind, "core emitted after release; dropping");
            return false;
        }
        if self.senders[kind.index()].send(event).is_err() {
            tracing::debug!(%kind, "no consumer for event queue; dropping");
            return false;
        }
        true
    }
}

/// Consumer side. Owned by exactly one subscription.
#[derive(Debug)]
pub struct EventStreams {
    receivers: [UnboundedReceiver<InboundEvent>; 2],
}

impl EventStreams {
    /// Pop the oldest queued event of `kind`, if any.
    pub fn try_next(&mut self, kind: EventKind) -> Option<InboundEvent> {
        match self.receivers[kind.index()].try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next event of any kind.
    ///
    /// Resolves to `None` once every emitter is gone and the queues are
    /// drained. Both queues share one set of senders, so they close together.
    pub async fn next(&mut self) -> Option<InboundEvent> {
        // A closed queue resolves `recv` immediately, so drain buffered
        // events before racing.
        for kind in EventKind::ALL {
            if let Some(event) = self.try_next(kind) {
                return Some(event);
            }
        }
        let [links, files] = &mut self.receivers;
        links.recv().race(files.recv()).await
    }
}
