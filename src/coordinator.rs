/// Background coordinator: reacts to icon clicks, tab events and page reports,
/// owns the SharedSlot and drives the side panel.
use crate::config::ExtensionConfig;
use crate::error::Result;
use crate::host::{BackgroundHost, PanelOptions, TabDescriptor, TabStatus};
use crate::messages::{ExtensionMessage, RepositoryObserved, TargetUrlResponse};
use crate::repository::Classifier;
use std::cell::RefCell;

/// In-memory bookkeeping of the background worker.
///
/// Rebuilt empty whenever the worker restarts. Only `current_target_url`
/// outlives a restart, through the SharedSlot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorState {
    /// Most recently activated or clicked tab; last one wins
    pub active_tab_id: Option<i32>,
    pub is_on_repository_page: bool,
    pub current_target_url: Option<String>,
    pub panel_open_for_active_tab: bool,
}

pub struct Coordinator<H> {
    host: H,
    classifier: Classifier,
    panel_path: String,
    state: RefCell<CoordinatorState>,
}

impl<H: BackgroundHost> Coordinator<H> {
    pub fn new(host: H, config: &ExtensionConfig) -> Result<Self> {
        Ok(Coordinator {
            host,
            classifier: Classifier::new(config)?,
            panel_path: config.panel_path.clone(),
            state: RefCell::new(CoordinatorState::default()),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Register the panel document once, on install
    pub async fn on_installed(&self) {
        let options = PanelOptions {
            enabled: true,
            path: Some(self.panel_path.clone()),
        };
        match self.host.set_panel_options(&options).await {
            Ok(()) => log::info!("Side panel configured with {}", self.panel_path),
            Err(e) => log::error!("Failed to configure side panel: {}", e),
        }
    }

    pub async fn on_icon_activated(&self, tab: &TabDescriptor) {
        self.state.borrow_mut().active_tab_id = Some(tab.id);

        let resolved = tab.url.as_deref().and_then(|url| self.classifier.resolve(url));
        let Some((identity, target)) = resolved else {
            log::info!("Tab {} is not a repository page, nothing to show", tab.id);
            self.state.borrow_mut().is_on_repository_page = false;
            return;
        };

        {
            let mut state = self.state.borrow_mut();
            state.is_on_repository_page = true;
            state.current_target_url = Some(target.clone());
        }

        if let Err(e) = self.host.write_slot(&target) {
            log::error!("Failed to store target URL {}: {}", target, e);
        }

        if let Err(e) = self.host.open_panel(tab.id).await {
            log::warn!("Could not open side panel for tab {}: {}", tab.id, e);
            return;
        }
        self.state.borrow_mut().panel_open_for_active_tab = true;

        self.push_load(&target).await;
        log::info!("Opening documentation sidebar for {}", identity);
    }

    pub async fn on_repository_observed(&self, observed: RepositoryObserved, sender_tab: Option<i32>) {
        let target = match self.classifier.resolve(&observed.source_url) {
            Some((_, derived)) => {
                if derived != observed.target_url {
                    log::warn!(
                        "Reported target {} disagrees with {}, using {}",
                        observed.target_url,
                        observed.source_url,
                        derived
                    );
                }
                derived
            }
            None => {
                log::warn!("Ignoring report for non-repository page {}", observed.source_url);
                return;
            }
        };

        {
            let mut state = self.state.borrow_mut();
            state.current_target_url = Some(target.clone());

            // Only activation and icon clicks move the reference tab; a fresh
            // worker with no reference yet adopts the reporting tab
            match (state.active_tab_id, sender_tab) {
                (None, Some(sender)) => {
                    state.active_tab_id = Some(sender);
                    state.is_on_repository_page = true;
                }
                (Some(active), Some(sender)) if active == sender => {
                    state.is_on_repository_page = true;
                }
                _ => {}
            }
        }

        log::info!("Received updated repository info for {}: {}", observed.identity, target);

        if let Err(e) = self.host.write_slot(&target) {
            log::error!("Failed to store target URL {}: {}", target, e);
        }

        if self.panel_open_for(sender_tab).await {
            self.push_load(&target).await;
            log::info!("Updated documentation sidebar with {}", target);
        }
    }

    pub async fn on_get_target_url_requested(&self) -> TargetUrlResponse {
        match self.host.read_slot().await {
            Ok(url) => TargetUrlResponse { url },
            Err(e) => {
                log::error!("Failed to read target URL: {}", e);
                TargetUrlResponse::default()
            }
        }
    }

    pub async fn on_tab_activated(&self, tab_id: i32) {
        self.state.borrow_mut().active_tab_id = Some(tab_id);

        let panel_open = match self.host.panel_options(tab_id).await {
            Ok(options) => options.enabled,
            Err(e) => {
                log::debug!("No panel options for tab {}: {}", tab_id, e);
                false
            }
        };

        let on_repository = match self.host.get_tab(tab_id).await {
            Ok(tab) => tab
                .and_then(|t| t.url)
                .is_some_and(|url| self.classifier.classify(&url).is_some()),
            Err(e) => {
                log::debug!("Could not look up tab {}: {}", tab_id, e);
                false
            }
        };

        // A newer activation may have landed while we were waiting
        let mut state = self.state.borrow_mut();
        if state.active_tab_id == Some(tab_id) {
            state.panel_open_for_active_tab = panel_open;
            state.is_on_repository_page = on_repository;
        }
    }

    pub fn on_tab_updated(&self, tab_id: i32, status: TabStatus, url: Option<&str>) {
        if status != TabStatus::Complete {
            return;
        }
        let is_repository = url.is_some_and(|u| self.classifier.classify(u).is_some());

        let mut state = self.state.borrow_mut();
        if is_repository && state.active_tab_id == Some(tab_id) {
            log::debug!("Tab {} updated to a repository page", tab_id);
            state.is_on_repository_page = true;
        }
    }

    /// Dispatch one bus message. Returns the answer for request-style messages.
    pub async fn handle_message(
        &self,
        message: ExtensionMessage,
        sender_tab: Option<i32>,
    ) -> Option<TargetUrlResponse> {
        match message {
            ExtensionMessage::GetTargetUrl => Some(self.on_get_target_url_requested().await),
            ExtensionMessage::UpdateTargetUrl { data } => {
                self.on_repository_observed(data, sender_tab).await;
                None
            }
            // Addressed to the panel
            ExtensionMessage::LoadTargetUrl { .. } => None,
        }
    }

    async fn panel_open_for(&self, sender_tab: Option<i32>) -> bool {
        let (tab_id, tracked_open) = {
            let state = self.state.borrow();
            (state.active_tab_id, state.panel_open_for_active_tab)
        };
        let Some(tab_id) = tab_id else {
            return false;
        };
        if !tracked_open || sender_tab != Some(tab_id) {
            return false;
        }

        match self.host.panel_options(tab_id).await {
            Ok(options) => options.enabled,
            Err(e) => {
                log::debug!("No panel options for tab {}: {}", tab_id, e);
                false
            }
        }
    }

    async fn push_load(&self, url: &str) {
        let message = ExtensionMessage::LoadTargetUrl {
            url: url.to_string(),
        };
        // No receiver yet is normal right after opening; the panel asks on startup
        if let Err(e) = self.host.send(&message).await {
            log::debug!("Load notification not delivered: {}", e);
        }
    }
}
