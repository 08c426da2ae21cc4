//! `window.open`-backed host shell.

use shuttle_bridge::{BridgeConfig, HostError, HostShell};
use smol_str::SmolStr;

use crate::js_error_message;
use crate::opener::{classify_open, requests_noopener};

/// Opens targets as new top-level browsing contexts in the current window.
#[derive(Debug, Clone)]
pub struct BrowserHost {
    target: SmolStr,
    features: SmolStr,
    noopener: bool,
}

impl BrowserHost {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            target: config.window_target.clone(),
            features: config.window_features.clone(),
            noopener: requests_noopener(&config.window_features),
        }
    }
}

impl HostShell for BrowserHost {
    fn open_new_context(&self, target: &str) -> Result<(), HostError> {
        let window =
            web_sys::window().ok_or_else(|| HostError::Unavailable("no global window".into()))?;
        match window.open_with_url_and_target_and_features(target, &self.target, &self.features) {
            Ok(opened) => classify_open(opened.is_some(), self.noopener),
            Err(err) => Err(HostError::Failed(js_error_message(&err))),
        }
    }
}
