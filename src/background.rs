/// Service worker wiring: routes chrome events into the coordinator
use crate::chrome::{
    ChromeHost, decode_message, from_js, onActionClicked, onInstalled, onRuntimeMessage,
    onTabActivated, onTabUpdated, to_js,
};
use crate::config::ExtensionConfig;
use crate::coordinator::Coordinator;
use crate::host::{TabDescriptor, TabStatus};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type BackgroundCoordinator = Rc<Coordinator<ChromeHost>>;

pub fn start(config: &ExtensionConfig) {
    let coordinator = match Coordinator::new(ChromeHost::new(&config.storage_key), config) {
        Ok(coordinator) => Rc::new(coordinator),
        Err(e) => {
            log::error!("Background coordinator not started: {}", e);
            return;
        }
    };

    listen_installed(&coordinator);
    listen_action_clicked(&coordinator);
    listen_tab_activated(&coordinator);
    listen_tab_updated(&coordinator);
    listen_messages(&coordinator);

    log::info!("Documentation sidebar background worker started");
}

fn listen_installed(coordinator: &BackgroundCoordinator) {
    let coordinator = coordinator.clone();
    let callback = Closure::wrap(Box::new(move || {
        let coordinator = coordinator.clone();
        spawn_local(async move { coordinator.on_installed().await });
    }) as Box<dyn FnMut()>);
    onInstalled(callback.as_ref().unchecked_ref());
    callback.forget();
}

fn listen_action_clicked(coordinator: &BackgroundCoordinator) {
    let coordinator = coordinator.clone();
    let callback = Closure::wrap(Box::new(move |tab: JsValue| {
        let tab: TabDescriptor = match from_js(tab) {
            Ok(tab) => tab,
            Err(e) => {
                log::error!("Unreadable tab in action click: {}", e);
                return;
            }
        };
        let coordinator = coordinator.clone();
        spawn_local(async move { coordinator.on_icon_activated(&tab).await });
    }) as Box<dyn FnMut(JsValue)>);
    onActionClicked(callback.as_ref().unchecked_ref());
    callback.forget();
}

fn listen_tab_activated(coordinator: &BackgroundCoordinator) {
    let coordinator = coordinator.clone();
    let callback = Closure::wrap(Box::new(move |tab_id: i32| {
        let coordinator = coordinator.clone();
        spawn_local(async move { coordinator.on_tab_activated(tab_id).await });
    }) as Box<dyn FnMut(i32)>);
    onTabActivated(callback.as_ref().unchecked_ref());
    callback.forget();
}

fn listen_tab_updated(coordinator: &BackgroundCoordinator) {
    let coordinator = coordinator.clone();
    let callback = Closure::wrap(Box::new(move |tab_id: i32, status: JsValue, url: JsValue| {
        let status = from_js::<TabStatus>(status).unwrap_or(TabStatus::Unknown);
        coordinator.on_tab_updated(tab_id, status, url.as_string().as_deref());
    }) as Box<dyn FnMut(i32, JsValue, JsValue)>);
    onTabUpdated(callback.as_ref().unchecked_ref());
    callback.forget();
}

/// Requests get a Promise back so the bridge keeps the response channel open
fn listen_messages(coordinator: &BackgroundCoordinator) {
    let coordinator = coordinator.clone();
    let handler = Closure::wrap(Box::new(move |message: JsValue, sender_tab: JsValue| -> JsValue {
        let Some(message) = decode_message(message) else {
            return JsValue::UNDEFINED;
        };
        let sender_tab = sender_tab.as_f64().map(|id| id as i32);
        let coordinator = coordinator.clone();

        if message.expects_response() {
            future_to_promise(async move {
                let reply = coordinator.handle_message(message, sender_tab).await;
                to_js(&reply).map_err(|e| JsValue::from_str(&e.to_string()))
            })
            .into()
        } else {
            spawn_local(async move {
                coordinator.handle_message(message, sender_tab).await;
            });
            JsValue::UNDEFINED
        }
    }) as Box<dyn FnMut(JsValue, JsValue) -> JsValue>);
    onRuntimeMessage(handler.as_ref().unchecked_ref());
    handler.forget();
}
