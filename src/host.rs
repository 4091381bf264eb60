//! Browser host capabilities the extension depends on.
//!
//! The background worker, content script and panel never call `chrome.*`
//! directly; they go through these traits. `crate::chrome` implements them
//! over the JS bridge, tests implement them in memory.
#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::messages::{ExtensionMessage, TargetUrlResponse};
use serde::{Deserialize, Serialize};

/// The part of a browser tab the extension looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabDescriptor {
    pub id: i32,
    #[serde(default)]
    pub url: Option<String>,
}

impl TabDescriptor {
    pub fn new(id: i32, url: Option<String>) -> TabDescriptor {
        TabDescriptor { id, url }
    }
}

/// `changeInfo.status` of a tab update event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelOptions {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// The single persisted key holding the current target URL
pub trait SharedSlot {
    /// Start a write. The host commits it whole; nothing waits on it.
    fn write_slot(&self, url: &str) -> Result<()>;

    async fn read_slot(&self) -> Result<Option<String>>;
}

pub trait PanelSurface {
    async fn open_panel(&self, tab_id: i32) -> Result<()>;

    async fn panel_options(&self, tab_id: i32) -> Result<PanelOptions>;

    async fn set_panel_options(&self, options: &PanelOptions) -> Result<()>;
}

pub trait MessageBus {
    /// Fire-and-forget notification to every other context
    async fn send(&self, message: &ExtensionMessage) -> Result<()>;

    /// Single round trip. `Ok(None)` means nobody answered.
    async fn request(&self, message: &ExtensionMessage) -> Result<Option<TargetUrlResponse>>;
}

pub trait TabDirectory {
    async fn get_tab(&self, tab_id: i32) -> Result<Option<TabDescriptor>>;
}

/// Everything the background coordinator needs from the browser
pub trait BackgroundHost: SharedSlot + PanelSurface + MessageBus + TabDirectory {}

impl<T> BackgroundHost for T where T: SharedSlot + PanelSurface + MessageBus + TabDirectory {}
