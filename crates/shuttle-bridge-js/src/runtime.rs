//! Editor core backed by a JavaScript module.
//!
//! The page hands over an object shaped like
//!
//! ```ts
//! interface CoreModule {
//!   init(): Promise<void>;
//!   instantiate(emit: (kind: string, payload: unknown) => void): CoreObject;
//! }
//! interface CoreObject {
//!   free(): void;
//!   pushMessage?(message: string): void;
//! }
//! ```
//!
//! which is what a wasm-bindgen generated core looks like after a thin
//! adapter.

use shuttle_bridge::{CoreInstance, EditorRuntime, EventEmitter, RuntimeError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::js_error_message;

#[wasm_bindgen]
extern "C" {
    /// The compiled editor core, as seen from JS.
    pub type CoreModule;

    #[wasm_bindgen(method, catch)]
    fn init(this: &CoreModule) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn instantiate(this: &CoreModule, emit: &js_sys::Function) -> Result<JsCoreObject, JsValue>;

    /// A live core instance owned by JS.
    pub type JsCoreObject;

    #[wasm_bindgen(method, catch)]
    fn free(this: &JsCoreObject) -> Result<(), JsValue>;

    #[wasm_bindgen(method, structural, getter, js_name = pushMessage)]
    fn push_message_fn(this: &JsCoreObject) -> JsValue;
}

pub struct JsRuntime {
    module: CoreModule,
}

impl JsRuntime {
    pub fn new(module: CoreModule) -> Self {
        Self { module }
    }
}

impl EditorRuntime for JsRuntime {
    type Instance = JsCoreInstance;

    async fn load(&self) -> Result<(), RuntimeError> {
        let promise = self
            .module
            .init()
            .map_err(|err| RuntimeError::new(js_error_message(&err)))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| RuntimeError::new(js_error_message(&err)))
    }

    fn instantiate(&self, emitter: EventEmitter) -> Result<JsCoreInstance, RuntimeError> {
        let emit = Closure::<dyn Fn(String, JsValue)>::new(move |kind: String, payload: JsValue| {
            let payload = match payload.as_string() {
                Some(json) => json,
                None => match js_sys::JSON::stringify(&payload) {
                    Ok(json) => String::from(json),
                    Err(err) => {
                        tracing::warn!(%kind, err = %js_error_message(&err), "unserializable event payload");
                        return;
                    }
                },
            };
            emitter.emit_raw(&kind, payload);
        });

        let object = self
            .module
            .instantiate(emit.as_ref().unchecked_ref())
            .map_err(|err| RuntimeError::new(js_error_message(&err)))?;
        Ok(JsCoreInstance {
            object,
            _emit: emit,
        })
    }
}

pub struct JsCoreInstance {
    object: JsCoreObject,
    // Kept alive for as long as the core may call it.
    _emit: Closure<dyn Fn(String, JsValue)>,
}

impl CoreInstance for JsCoreInstance {
    fn push_message(&self, message: &str) {
        let Ok(push) = self.object.push_message_fn().dyn_into::<js_sys::Function>() else {
            tracing::debug!("core has no pushMessage; dropping inbound message");
            return;
        };
        if let Err(err) = push.call1(&self.object, &JsValue::from_str(message)) {
            tracing::warn!(err = %js_error_message(&err), "core rejected inbound message");
        }
    }

    fn free(&mut self) -> Result<(), RuntimeError> {
        self.object
            .free()
            .map_err(|err| RuntimeError::new(js_error_message(&err)))
    }
}
