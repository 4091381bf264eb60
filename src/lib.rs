/// DeepWiki Sidebar - Chrome Extension showing repository documentation
/// Built with Rust + WASM + Yew

mod background;
mod chrome;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod messages;
pub mod page_watcher;
pub mod panel;
pub mod repository;
pub mod ui;

#[cfg(test)]
mod testing;

use std::rc::Rc;
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the classifier for JavaScript access
#[wasm_bindgen]
pub fn classify_url(url: &str) -> Option<String> {
    repository::classify(url).map(|identity| identity.to_string())
}

#[wasm_bindgen]
pub fn target_url_for(url: &str) -> Option<String> {
    repository::classify(url).map(|identity| repository::target_url(&identity))
}

fn entry_config(docs_base: Option<String>) -> Option<config::ExtensionConfig> {
    match config::ExtensionConfig::for_entry(docs_base.as_deref()) {
        Ok(config) => Some(config),
        Err(e) => {
            log::error!("Not starting: {}", e);
            None
        }
    }
}

// Service worker entry
#[wasm_bindgen]
pub fn start_background(docs_base: Option<String>) {
    if let Some(config) = entry_config(docs_base) {
        background::start(&config);
    }
}

// Content script entry, injected on github.com pages
#[wasm_bindgen]
pub fn start_content_script(docs_base: Option<String>) {
    if let Some(config) = entry_config(docs_base) {
        page_watcher::start(&config);
    }
}

// Start the Yew app for the side panel
#[wasm_bindgen]
pub fn start_side_panel(docs_base: Option<String>) {
    if let Some(config) = entry_config(docs_base) {
        yew::Renderer::<ui::side_panel::SidePanel>::with_props(ui::side_panel::SidePanelProps {
            config: Rc::new(config),
        })
        .render();
    }
}
