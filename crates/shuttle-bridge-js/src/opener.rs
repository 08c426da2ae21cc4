//! How `window.open` results map onto host outcomes.
//!
//! `window.open` returns `null` both when a popup blocker steps in and
//! whenever `noopener` is requested. Only the former
//! is a refusal.

use shuttle_bridge::HostError;

/// Whether a window feature string asks for `noopener` (or implies it via
/// `noreferrer`).
pub fn requests_noopener(features: &str) -> bool {
    features
        .split([',', ' '])
        .map(|feature| feature.split('=').next().unwrap_or_default().trim())
        .any(|name| name.eq_ignore_ascii_case("noopener") || name.eq_ignore_ascii_case("noreferrer"))
}

/// Classify a `window.open` call that did not throw.
pub fn classify_open(returned_window: bool, noopener: bool) -> Result<(), HostError> {
    if returned_window || noopener {
        Ok(())
    } else {
        Err(HostError::Blocked)
    }
}
