//! Error types for the bridge.
//!
//! Only [`BridgeError::Initialization`] is meant to cross into the embedding
//! host. Everything else is either a programming error surfaced to the caller
//! or absorbed (logged) inside the bridge.

use miette::Diagnostic;
use smol_str::SmolStr;

use crate::events::EventKind;
use crate::lifecycle::LifecycleState;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum BridgeError {
    /// The core runtime failed to load. Fatal to the session.
    #[error("core runtime failed to initialize: {0}")]
    #[diagnostic(
        code(shuttle::lifecycle::initialization),
        help("the session cannot continue; no core instance was created")
    )]
    Initialization(#[source] RuntimeError),

    /// The runtime loaded but refused to construct an instance.
    #[error("core runtime failed to create an instance: {0}")]
    #[diagnostic(code(shuttle::lifecycle::instantiation))]
    Instantiation(#[source] RuntimeError),

    /// `create_instance` was called while a handle is still alive.
    #[error("a core instance is already alive for this session")]
    #[diagnostic(
        code(shuttle::lifecycle::already_live),
        help("release the current instance before creating another one")
    )]
    InstanceAlreadyLive,

    /// A lifecycle operation was attempted from the wrong state.
    #[error("cannot {operation} while the core lifecycle is {state}")]
    #[diagnostic(code(shuttle::lifecycle::invalid_state))]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    /// Handlers were registered against a handle that is not alive.
    #[error("core handle is not ready for subscriptions")]
    #[diagnostic(code(shuttle::bridge::not_ready))]
    NotReady,

    /// The per-kind queues of a handle only have a single consumer.
    #[error("event streams of core handle {handle} are already subscribed")]
    #[diagnostic(code(shuttle::bridge::already_subscribed))]
    AlreadySubscribed { handle: u64 },

    /// The global inbound sink slot is taken.
    #[error("global sink `{name}` is already installed")]
    #[diagnostic(code(shuttle::sink::occupied))]
    SinkOccupied { name: SmolStr },

    /// Bridge configuration could not be parsed.
    #[error("invalid bridge configuration: {0}")]
    #[diagnostic(code(shuttle::config))]
    Config(#[from] serde_json::Error),
}

/// Failure reported by the opaque core runtime.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by the host when opening a browsing context.
///
/// These never propagate out of the bridge; a blocked popup looks the same to
/// the core as a user declining the action.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostError {
    /// The host refused to open the context (e.g. popup blocker).
    #[error("host blocked opening a new browsing context")]
    Blocked,

    /// The host environment is not reachable (no window, no display).
    #[error("host environment unavailable: {0}")]
    Unavailable(String),

    /// Anything else the host reported.
    #[error("host failed to open target: {0}")]
    Failed(String),
}

/// An event payload that could not be decoded.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("malformed {kind} payload: {source}")]
    #[diagnostic(code(shuttle::events::malformed))]
    Malformed {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} payload: {reason}")]
    #[diagnostic(code(shuttle::events::invalid))]
    Invalid { kind: EventKind, reason: &'static str },

    #[error("unknown event kind `{0}`")]
    #[diagnostic(code(shuttle::events::unknown_kind))]
    UnknownKind(SmolStr),
}
