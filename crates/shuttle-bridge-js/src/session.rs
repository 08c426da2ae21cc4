//! Page-facing session object.

use std::rc::Rc;

use shuttle_bridge::sink::{self, SinkDelivery};
use shuttle_bridge::{BridgeConfig, EditorSession, MountOutcome};
use smol_str::SmolStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::host::BrowserHost;
use crate::runtime::{CoreModule, JsRuntime};
use crate::{js_error_message, telemetry};

/// One editor mount, bound to a compiled core module.
///
/// Constructing it exposes the inbound sink as `globalThis[sinkName]`, and
/// fails if that property is already taken.
#[wasm_bindgen]
pub struct JsEditorSession {
    inner: Rc<EditorSession<JsRuntime, BrowserHost>>,
    sink_name: SmolStr,
    global_sink: Closure<dyn Fn(String) -> bool>,
}

#[wasm_bindgen]
impl JsEditorSession {
    /// Create a session. `config` may be omitted, or a partial object such as
    /// `{ sinkName: "pushToEditor" }`.
    #[wasm_bindgen(constructor)]
    pub fn new(core: CoreModule, config: JsValue) -> Result<JsEditorSession, JsError> {
        let config: BridgeConfig = if config.is_undefined() || config.is_null() {
            BridgeConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("invalid bridge configuration: {e}")))?
        };
        telemetry::init(&config.log_level);

        let sink_name = config.sink_name.clone();
        let name = sink_name.clone();
        let global_sink = Closure::<dyn Fn(String) -> bool>::new(move |message: String| {
            sink::deliver(&name, &message) == SinkDelivery::Delivered
        });
        let global = js_sys::global();
        let key = JsValue::from_str(&sink_name);
        let existing = js_sys::Reflect::get(&global, &key)
            .map_err(|err| JsError::new(&js_error_message(&err)))?;
        if !existing.is_undefined() {
            return Err(JsError::new(&format!(
                "global `{sink_name}` is already defined; unmount the session that owns it first"
            )));
        }
        js_sys::Reflect::set(&global, &key, global_sink.as_ref())
            .map_err(|err| JsError::new(&js_error_message(&err)))?;

        let host = BrowserHost::new(&config);
        let inner = EditorSession::new(JsRuntime::new(core), host, &config);
        tracing::debug!(sink = %sink_name, "editor session created");

        Ok(Self {
            inner: Rc::new(inner),
            sink_name,
            global_sink,
        })
    }

    /// Load the core and start dispatching its events.
    ///
    /// Resolves `true` once the editor is renderable, `false` if `unmount`
    /// won the race, and rejects if the core failed to initialize.
    pub fn mount(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            match inner.mount().await {
                Ok(MountOutcome::Mounted(subscription)) => {
                    spawn_local(async move {
                        let report = subscription.run().await;
                        tracing::debug!(?report, "event dispatch finished");
                    });
                    Ok(JsValue::TRUE)
                }
                Ok(MountOutcome::Abandoned) => Ok(JsValue::FALSE),
                Err(err) => {
                    tracing::error!(%err, "editor core failed to mount");
                    Err(JsError::new(&err.to_string()).into())
                }
            }
        })
    }

    /// Release the core. Safe to call at any time, any number of times.
    pub fn unmount(&self) {
        self.inner.unmount();
        self.remove_global_sink();
    }

    /// Push a message into the core, same as calling the global sink.
    #[wasm_bindgen(js_name = sendMessage)]
    pub fn send_message(&self, message: &str) -> bool {
        sink::deliver(&self.sink_name, message) == SinkDelivery::Delivered
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.lifecycle().state().as_str().to_owned()
    }

    #[wasm_bindgen(getter, js_name = isRenderable)]
    pub fn is_renderable(&self) -> bool {
        self.inner.lifecycle().is_renderable()
    }

    /// Call `callback(state, renderable)` now and on every lifecycle change,
    /// until the session is released.
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&self, callback: js_sys::Function) {
        let mut rx = self.inner.lifecycle().watch();
        spawn_local(async move {
            loop {
                let status = *rx.borrow_and_update();
                if let Err(err) = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(status.state.as_str()),
                    &JsValue::from_bool(status.is_renderable()),
                ) {
                    tracing::warn!(err = %js_error_message(&err), "state callback threw");
                }
                if status.state.is_terminal() || rx.changed().await.is_err() {
                    break;
                }
            }
        });
    }
}

impl JsEditorSession {
    fn remove_global_sink(&self) {
        let global = js_sys::global();
        let key = JsValue::from_str(&self.sink_name);
        // Only remove the property if it is still ours.
        let ours = js_sys::Reflect::get(&global, &key)
            .map(|current| current == *self.global_sink.as_ref())
            .unwrap_or(false);
        if ours && js_sys::Reflect::delete_property(&global, &key).is_err() {
            tracing::debug!(sink = %self.sink_name, "could not remove global sink");
        }
    }
}

impl Drop for JsEditorSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
