/// In-memory host used by unit tests
use crate::error::{ExtensionError, Result};
use crate::host::{MessageBus, PanelOptions, PanelSurface, SharedSlot, TabDescriptor, TabDirectory};
use crate::messages::{ExtensionMessage, TargetUrlResponse};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeHost {
    pub slot: RefCell<Option<String>>,
    pub slot_writes: RefCell<Vec<String>>,
    pub opened: RefCell<Vec<i32>>,
    pub deny_open: bool,
    pub panel_enabled: bool,
    pub fail_options: bool,
    pub options_set: RefCell<Vec<PanelOptions>>,
    pub sent: RefCell<Vec<ExtensionMessage>>,
    pub requests: RefCell<Vec<ExtensionMessage>>,
    /// `None` simulates a receiver that was torn down before answering
    pub response: RefCell<Option<TargetUrlResponse>>,
    pub tabs: RefCell<HashMap<i32, String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            panel_enabled: true,
            ..FakeHost::default()
        }
    }

    pub fn with_tab(self, id: i32, url: &str) -> Self {
        self.tabs.borrow_mut().insert(id, url.to_string());
        self
    }

    pub fn sent_loads(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|m| match m {
                ExtensionMessage::LoadTargetUrl { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SharedSlot for FakeHost {
    fn write_slot(&self, url: &str) -> Result<()> {
        self.slot_writes.borrow_mut().push(url.to_string());
        *self.slot.borrow_mut() = Some(url.to_string());
        Ok(())
    }

    async fn read_slot(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }
}

impl PanelSurface for FakeHost {
    async fn open_panel(&self, tab_id: i32) -> Result<()> {
        if self.deny_open {
            return Err(ExtensionError::PanelOpenDenied(
                "sidePanel.open() may only be called in response to a user gesture".to_string(),
            ));
        }
        self.opened.borrow_mut().push(tab_id);
        Ok(())
    }

    async fn panel_options(&self, _tab_id: i32) -> Result<PanelOptions> {
        if self.fail_options {
            return Err(ExtensionError::Bridge("No tab with id".to_string()));
        }
        Ok(PanelOptions {
            enabled: self.panel_enabled,
            path: None,
        })
    }

    async fn set_panel_options(&self, options: &PanelOptions) -> Result<()> {
        self.options_set.borrow_mut().push(options.clone());
        Ok(())
    }
}

impl MessageBus for FakeHost {
    async fn send(&self, message: &ExtensionMessage) -> Result<()> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }

    async fn request(&self, message: &ExtensionMessage) -> Result<Option<TargetUrlResponse>> {
        self.requests.borrow_mut().push(message.clone());
        Ok(self.response.borrow().clone())
    }
}

impl TabDirectory for FakeHost {
    async fn get_tab(&self, tab_id: i32) -> Result<Option<TabDescriptor>> {
        Ok(self
            .tabs
            .borrow()
            .get(&tab_id)
            .map(|url| TabDescriptor::new(tab_id, Some(url.clone()))))
    }
}
