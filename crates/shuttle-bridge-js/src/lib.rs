//! WASM bindings for the shuttle editor-core bridge.
//!
//! Exposes `JsEditorSession` to the page: construct it with the compiled
//! core module, call `mount()` when the editor component mounts and
//! `unmount()` when it goes away. Link and embedded-file events from the core
//! open in new browser tabs via `window.open`.
//!
//! Only `opener` is portable; everything else assumes
//! `wasm32-unknown-unknown`.

pub mod opener;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
mod host;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
mod runtime;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
mod session;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
mod telemetry;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use host::BrowserHost;
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use runtime::{CoreModule, JsCoreObject, JsRuntime};
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use session::JsEditorSession;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Extract a readable message from a thrown JS value.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub(crate) fn js_error_message(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}
