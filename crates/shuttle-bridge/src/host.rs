//! Host shell capability used by the dispatch bridge.

use std::rc::Rc;

use crate::error::HostError;

/// Opens targets in new top-level browsing contexts.
///
/// This is the only call the bridge makes into the host.
pub trait HostShell {
    fn open_new_context(&self, target: &str) -> Result<(), HostError>;
}

impl<H: HostShell + ?Sized> HostShell for Rc<H> {
    fn open_new_context(&self, target: &str) -> Result<(), HostError> {
        (**self).open_new_context(target)
    }
}

impl<H: HostShell + ?Sized> HostShell for &H {
    fn open_new_context(&self, target: &str) -> Result<(), HostError> {
        (**self).open_new_context(target)
    }
}
