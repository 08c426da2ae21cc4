//! Process-wide inbound sink.
//!
//! The embedding host pushes out-of-band messages into the core through one
//! named entry point rather than a passed reference. The slot is installed
//! when a core handle is created and cleared when it is released; its guard
//! is the [`SinkRegistration`] stored on the handle.
//!
//! Delivering to an empty or mismatched slot is ignored, never an error.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smol_str::SmolStr;

use crate::error::{BridgeError, Result};

/// Callback behind the slot. Returns whether the message reached a live core.
type SinkFn = Rc<dyn Fn(&str) -> bool>;

struct InstalledSink {
    name: SmolStr,
    token: u64,
    sink: SinkFn,
}

thread_local! {
    static GLOBAL_SINK: RefCell<Option<InstalledSink>> = const { RefCell::new(None) };
    static NEXT_TOKEN: Cell<u64> = const { Cell::new(1) };
}

/// Outcome of [`deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkDelivery {
    Delivered,
    Ignored,
}

/// Guard for an installed sink. Dropping it clears the slot.
#[derive(Debug)]
#[must_use = "dropping the registration uninstalls the sink"]
pub struct SinkRegistration {
    name: SmolStr,
    token: u64,
}

impl SinkRegistration {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clear the slot now. Same as dropping.
    pub fn uninstall(self) {}
}

impl Drop for SinkRegistration {
    fn drop(&mut self) {
        let removed = GLOBAL_SINK.with(|slot| {
            let mut slot = slot.borrow_mut();
            match slot.as_ref() {
                Some(installed) if installed.token == self.token => slot.take(),
                _ => None,
            }
        });
        if removed.is_some() {
            tracing::debug!(name = %self.name, "global sink uninstalled");
        }
    }
}

/// Install `sink` under `name`. Fails if any sink is already installed.
pub fn install(
    name: impl Into<SmolStr>,
    sink: impl Fn(&str) -> bool + 'static,
) -> Result<SinkRegistration> {
    let name = name.into();
    GLOBAL_SINK.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(installed) = slot.as_ref() {
            return Err(BridgeError::SinkOccupied {
                name: installed.name.clone(),
            });
        }
        let token = NEXT_TOKEN.with(|next| next.replace(next.get() + 1));
        *slot = Some(InstalledSink {
            name: name.clone(),
            token,
            sink: Rc::new(sink),
        });
        tracing::debug!(%name, "global sink installed");
        Ok(SinkRegistration { name, token })
    })
}

/// Push `message` into the sink named `name`.
pub fn deliver(name: &str, message: &str) -> SinkDelivery {
    // Clone the callback out so it can reach back into the slot.
    let sink = GLOBAL_SINK.with(|slot| {
        slot.borrow()
            .as_ref()
            .filter(|installed| installed.name == name)
            .map(|installed| installed.sink.clone())
    });
    let Some(sink) = sink else {
        tracing::debug!(name, "no global sink installed; ignoring message");
        return SinkDelivery::Ignored;
    };
    if sink(message) {
        SinkDelivery::Delivered
    } else {
        tracing::debug!(name, "global sink target released; ignoring message");
        SinkDelivery::Ignored
    }
}

/// Name of the currently installed sink, if any.
pub fn installed_name() -> Option<SmolStr> {
    GLOBAL_SINK.with(|slot| slot.borrow().as_ref().map(|installed| installed.name.clone()))
}
