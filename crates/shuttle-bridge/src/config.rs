use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::Result;

/// Default name of the global inbound sink.
pub const DEFAULT_SINK_NAME: &str = "sendMessageToCore";

/// Bridge configuration.
///
/// Every field has a default, so partial documents (or an empty object) are
/// valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Name the global sink is installed under.
    pub sink_name: SmolStr,
    /// Browsing-context name passed to the host when opening targets.
    pub window_target: SmolStr,
    /// Window feature string passed along with the target.
    pub window_features: SmolStr,
    /// Log filter directive for hosts that install a subscriber.
    pub log_level: SmolStr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let log_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };
        Self {
            sink_name: SmolStr::new_static(DEFAULT_SINK_NAME),
            window_target: SmolStr::new_static("_blank"),
            window_features: SmolStr::new_static("noopener,noreferrer"),
            log_level: SmolStr::new_static(log_level),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
