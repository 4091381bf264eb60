/// Side panel document: shows the documentation page in an embedded frame

use yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use patternfly_yew::prelude::*;
use std::rc::Rc;
use crate::chrome::{decode_message, onRuntimeMessage, removeRuntimeMessageListener, ChromeHost, Interval};
use crate::config::ExtensionConfig;
use crate::messages::ExtensionMessage;
use crate::panel::{request_target_url, PanelAction, PanelState};

/// Map a runtime message to a panel action; only load pushes count
pub(crate) fn push_action(message: JsValue) -> Option<PanelAction> {
    match decode_message(message)? {
        ExtensionMessage::LoadTargetUrl { url } => {
            log::info!("Received message to load new URL: {}", url);
            Some(PanelAction::Load(url))
        }
        _ => None,
    }
}

#[derive(Properties, PartialEq)]
pub struct SidePanelProps {
    #[prop_or_default]
    pub config: Rc<ExtensionConfig>,
}

#[function_component(SidePanel)]
pub fn side_panel(props: &SidePanelProps) -> Html {
    let panel = use_reducer(PanelState::default);

    // Startup request, push subscription and fallback poll, for the
    // lifetime of the panel document
    {
        let dispatcher = panel.dispatcher();
        let config = props.config.clone();

        use_effect_with((), move |_| {
            let host = Rc::new(ChromeHost::new(&config.storage_key));

            log::info!("Side panel loaded, requesting documentation URL");
            {
                let dispatcher = dispatcher.clone();
                let host = host.clone();
                spawn_local(async move {
                    let url = request_target_url(host.as_ref()).await;
                    dispatcher.dispatch(PanelAction::Startup(url));
                });
            }

            let on_message = {
                let dispatcher = dispatcher.clone();
                Closure::wrap(Box::new(move |message: JsValue, _sender_tab: JsValue| -> JsValue {
                    if let Some(action) = push_action(message) {
                        dispatcher.dispatch(action);
                    }
                    // The panel never answers; the background does
                    JsValue::UNDEFINED
                }) as Box<dyn FnMut(JsValue, JsValue) -> JsValue>)
            };
            let listener = onRuntimeMessage(on_message.as_ref().unchecked_ref());

            let poll = {
                let dispatcher = dispatcher.clone();
                let host = host.clone();
                Interval::new(config.panel_poll_ms, move || {
                    let dispatcher = dispatcher.clone();
                    let host = host.clone();
                    spawn_local(async move {
                        let url = request_target_url(host.as_ref()).await;
                        dispatcher.dispatch(PanelAction::Poll(url));
                    });
                })
            };
            let poll = match poll {
                Ok(interval) => Some(interval),
                Err(e) => {
                    log::warn!("Fallback URL check not started: {}", e);
                    None
                }
            };

            move || {
                removeRuntimeMessageListener(&listener);
                drop(on_message);
                drop(poll);
            }
        });
    }

    let on_frame_load = {
        let dispatcher = panel.dispatcher();
        Callback::from(move |_: web_sys::Event| dispatcher.dispatch(PanelAction::FrameLoaded))
    };

    let on_frame_error = {
        let dispatcher = panel.dispatcher();
        Callback::from(move |e: web_sys::Event| {
            dispatcher.dispatch(PanelAction::FrameFailed(format!("{} event from frame", e.type_())))
        })
    };

    let frame_style = if panel.is_frame_visible() {
        "display: block;"
    } else {
        "display: none;"
    };

    html! {
        <div class="panel-container">
            if panel.is_loading() {
                <div class="loading-text-center">
                    <Spinner />
                    <p class="loading-text">{"Loading documentation..."}</p>
                </div>
            }

            if let Some(message) = panel.error() {
                <div class="message-top-margin">
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {message.to_string()}
                    </Alert>
                </div>
            }

            if let Some(src) = panel.frame_src.clone() {
                <iframe
                    key={panel.src_assignments.to_string()}
                    class="docs-frame"
                    style={frame_style}
                    src={src}
                    onload={on_frame_load}
                    onerror={on_frame_error}
                />
            }
        </div>
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::chrome::browser_tests::{install_chrome_stub, js};
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_push_action_from_js_message() {
        assert_eq!(
            push_action(js(r#"{"action":"loadTargetURL","url":"https://deepwiki.com/foo/bar"}"#)),
            Some(PanelAction::Load("https://deepwiki.com/foo/bar".to_string()))
        );
        assert_eq!(push_action(js(r#"{"action":"getTargetURL"}"#)), None);
        assert_eq!(push_action(js(r#"{"action":"loadTargetURL"}"#)), None);
        assert_eq!(push_action(JsValue::UNDEFINED), None);
    }

    #[wasm_bindgen_test]
    async fn test_startup_then_push_reaches_loaded() {
        install_chrome_stub("Promise.resolve({ url: 'https://deepwiki.com/foo/bar' })");
        let host = ChromeHost::new("targetURL");
        let mut state = PanelState::default();

        state.apply(PanelAction::Startup(request_target_url(&host).await));
        assert!(state.is_loading());
        state.apply(PanelAction::FrameLoaded);

        let pushed = push_action(js(r#"{"action":"loadTargetURL","url":"https://deepwiki.com/foo/bar"}"#));
        state.apply(pushed.unwrap());

        assert!(state.is_frame_visible());
        assert_eq!(state.src_assignments, 1);
    }

    #[wasm_bindgen_test]
    async fn test_startup_without_answer_shows_error() {
        install_chrome_stub("Promise.reject(new Error('Receiving end does not exist.'))");
        let host = ChromeHost::new("targetURL");
        let mut state = PanelState::default();

        state.apply(PanelAction::Startup(request_target_url(&host).await));

        assert_eq!(state.error(), Some(crate::panel::NO_TARGET_MESSAGE));
    }
}
