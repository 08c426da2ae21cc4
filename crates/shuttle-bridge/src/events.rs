//! Event kinds emitted by the editor core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::PayloadError;

/// Named category of event the core can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    VisitLink,
    OpenEmbeddedFile,
}

impl EventKind {
    /// Every kind the bridge knows how to dispatch, in queue order.
    pub const ALL: [EventKind; 2] = [EventKind::VisitLink, EventKind::OpenEmbeddedFile];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::VisitLink => "VisitLink",
            EventKind::OpenEmbeddedFile => "OpenEmbeddedFile",
        }
    }

    /// Position of this kind's queue in per-kind tables.
    pub(crate) fn index(self) -> usize {
        match self {
            EventKind::VisitLink => 0,
            EventKind::OpenEmbeddedFile => 1,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VisitLink" => Ok(EventKind::VisitLink),
            "OpenEmbeddedFile" => Ok(EventKind::OpenEmbeddedFile),
            other => Err(PayloadError::UnknownKind(SmolStr::new(other))),
        }
    }
}

/// A single event from the core. Immutable and consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EditorEvent {
    /// Open `url` in a new top-level browsing context.
    VisitLink { url: String },
    /// Open the embedded file at the root-relative `path`.
    OpenEmbeddedFile { path: String },
}

#[derive(Deserialize)]
struct VisitLinkPayload {
    url: String,
}

#[derive(Deserialize)]
struct OpenEmbeddedFilePayload {
    path: String,
}

impl EditorEvent {
    pub fn visit_link(url: impl Into<String>) -> Self {
        EditorEvent::VisitLink { url: url.into() }
    }

    pub fn open_embedded_file(path: impl Into<String>) -> Self {
        EditorEvent::OpenEmbeddedFile { path: path.into() }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::VisitLink { .. } => EventKind::VisitLink,
            EditorEvent::OpenEmbeddedFile { .. } => EventKind::OpenEmbeddedFile,
        }
    }

    /// Decode the JSON payload of an event of the given kind.
    ///
    /// The payload is the bare object carrying the kind's single field,
    /// e.g. `{"url": "https://example.com"}`.
    pub fn decode(kind: EventKind, payload: &str) -> Result<Self, PayloadError> {
        let malformed = |source| PayloadError::Malformed { kind, source };
        let event = match kind {
            EventKind::VisitLink => {
                let VisitLinkPayload { url } = serde_json::from_str(payload).map_err(malformed)?;
                EditorEvent::VisitLink { url }
            }
            EventKind::OpenEmbeddedFile => {
                let OpenEmbeddedFilePayload { path } =
                    serde_json::from_str(payload).map_err(malformed)?;
                EditorEvent::OpenEmbeddedFile { path }
            }
        };
        event.validate()?;
        Ok(event)
    }

    /// Reject payloads that decode but cannot name a target.
    pub fn validate(&self) -> Result<(), PayloadError> {
        match self {
            EditorEvent::VisitLink { url } if url.trim().is_empty() => Err(PayloadError::Invalid {
                kind: EventKind::VisitLink,
                reason: "empty url",
            }),
            // A leading slash would turn "/" + path into a protocol-relative URL.
            EditorEvent::OpenEmbeddedFile { path } if path.is_empty() || path.starts_with('/') => {
                Err(PayloadError::Invalid {
                    kind: EventKind::OpenEmbeddedFile,
                    reason: "path must be non-empty and relative",
                })
            }
            _ => Ok(()),
        }
    }

    /// The string handed to the host to open.
    pub fn target(&self) -> String {
        match self {
            EditorEvent::VisitLink { url } => url.clone(),
            EditorEvent::OpenEmbeddedFile { path } => format!("/{path}"),
        }
    }
}
