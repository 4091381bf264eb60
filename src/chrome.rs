/// chrome.* bindings through the JS bridge, plus browser timers
use crate::error::{ExtensionError, Result};
use crate::host::{MessageBus, PanelOptions, PanelSurface, SharedSlot, TabDescriptor, TabDirectory};
use crate::messages::{ExtensionMessage, TargetUrlResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

// Import JS bridge functions
#[wasm_bindgen(module = "/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    fn setStorage(key: &str, value: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openSidePanel(tab_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSidePanelOptions(tab_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSidePanelOptions(options: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRequest(message: JsValue) -> std::result::Result<JsValue, JsValue>;

    pub fn onInstalled(callback: &js_sys::Function);

    pub fn onActionClicked(callback: &js_sys::Function);

    pub fn onTabActivated(callback: &js_sys::Function);

    pub fn onTabUpdated(callback: &js_sys::Function);

    /// Returns the registered listener so it can be removed again
    pub fn onRuntimeMessage(handler: &js_sys::Function) -> JsValue;

    pub fn removeRuntimeMessageListener(listener: &JsValue);
}

fn bridge_error(e: JsValue) -> ExtensionError {
    ExtensionError::Bridge(
        e.as_string()
            .or_else(|| {
                e.dyn_ref::<js_sys::Error>()
                    .map(|err| String::from(err.message()))
            })
            .unwrap_or_else(|| format!("{:?}", e)),
    )
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ExtensionError::Serialization(format!("{:?}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| ExtensionError::Serialization(format!("{:?}", e)))
}

/// Decode an incoming runtime message; unknown shapes are dropped
pub fn decode_message(value: JsValue) -> Option<ExtensionMessage> {
    let raw: serde_json::Value = from_js(value).ok()?;
    ExtensionMessage::decode(&raw)
}

/// chrome.storage.local, chrome.sidePanel, chrome.runtime and chrome.tabs
#[derive(Debug, Clone)]
pub struct ChromeHost {
    storage_key: String,
}

impl ChromeHost {
    pub fn new(storage_key: &str) -> ChromeHost {
        ChromeHost {
            storage_key: storage_key.to_string(),
        }
    }
}

impl SharedSlot for ChromeHost {
    fn write_slot(&self, url: &str) -> Result<()> {
        setStorage(&self.storage_key, url).map_err(bridge_error)
    }

    async fn read_slot(&self) -> Result<Option<String>> {
        let value = getStorage(&self.storage_key).await.map_err(bridge_error)?;
        Ok(value.as_string())
    }
}

impl PanelSurface for ChromeHost {
    async fn open_panel(&self, tab_id: i32) -> Result<()> {
        openSidePanel(tab_id)
            .await
            .map_err(|e| ExtensionError::PanelOpenDenied(bridge_error(e).to_string()))
    }

    async fn panel_options(&self, tab_id: i32) -> Result<PanelOptions> {
        let value = getSidePanelOptions(tab_id).await.map_err(bridge_error)?;
        from_js(value)
    }

    async fn set_panel_options(&self, options: &PanelOptions) -> Result<()> {
        setSidePanelOptions(to_js(options)?).await.map_err(bridge_error)
    }
}

impl MessageBus for ChromeHost {
    async fn send(&self, message: &ExtensionMessage) -> Result<()> {
        sendMessage(to_js(message)?).await.map_err(bridge_error)
    }

    async fn request(&self, message: &ExtensionMessage) -> Result<Option<TargetUrlResponse>> {
        let value = sendRequest(to_js(message)?).await.map_err(bridge_error)?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        from_js(value).map(Some)
    }
}

impl TabDirectory for ChromeHost {
    async fn get_tab(&self, tab_id: i32) -> Result<Option<TabDescriptor>> {
        let value = getTab(tab_id).await.map_err(bridge_error)?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        from_js(value).map(Some)
    }
}

/// Resolve after `ms` milliseconds
pub async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// A `setInterval` timer, cleared when dropped
pub struct Interval {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(ms: u32, callback: impl FnMut() + 'static) -> Result<Interval> {
        let window = web_sys::window()
            .ok_or_else(|| ExtensionError::Bridge("no window for interval".to_string()))?;
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut()>);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                ms as i32,
            )
            .map_err(bridge_error)?;

        Ok(Interval {
            handle,
            _callback: callback,
        })
    }

    /// Keep the timer running for the lifetime of the document
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}
