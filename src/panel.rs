/// Side panel state: which URL the embedded frame shows and what is visible
use crate::host::MessageBus;
use crate::messages::{ExtensionMessage, TargetUrlResponse};
use std::rc::Rc;
use yew::prelude::*;

pub const NO_TARGET_MESSAGE: &str = "No documentation URL available. Please navigate to a GitHub repository and click the extension icon again.";

/// `Idle -> Loading -> {Loaded, Error}`, and back to `Loading` on a new URL
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    /// Push notification or any other candidate URL
    Load(String),
    /// Answer to the startup request; `None` when nothing is stored
    Startup(Option<String>),
    /// Answer to the fallback request
    Poll(Option<String>),
    FrameLoaded,
    FrameFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub phase: PanelPhase,
    pub last_loaded_url: Option<String>,
    /// Current `src` of the embedded frame
    pub frame_src: Option<String>,
    /// Bumped on every `src` assignment; keys the frame element so the same
    /// URL can be reloaded after a failure
    pub src_assignments: u32,
}

impl PanelState {
    pub fn is_loading(&self) -> bool {
        self.phase == PanelPhase::Loading
    }

    pub fn is_frame_visible(&self) -> bool {
        self.phase == PanelPhase::Loaded
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            PanelPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Point the frame at `url`. Returns false when the URL is already
    /// showing and nothing was touched.
    pub fn load_target_url(&mut self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        if self.last_loaded_url.as_deref() == Some(url) && self.is_frame_visible() {
            log::debug!("URL {} is already loaded, skipping reload", url);
            return false;
        }

        log::info!("Loading documentation URL: {}", url);
        self.phase = PanelPhase::Loading;
        self.frame_src = Some(url.to_string());
        self.last_loaded_url = Some(url.to_string());
        self.src_assignments += 1;
        true
    }

    pub fn show_error(&mut self, message: String) {
        log::error!("{}", message);
        self.phase = PanelPhase::Error(message);
    }

    pub fn apply(&mut self, action: PanelAction) {
        match action {
            PanelAction::Load(url) => {
                self.load_target_url(&url);
            }
            PanelAction::Startup(Some(url)) => {
                self.load_target_url(&url);
            }
            PanelAction::Startup(None) => {
                // A push may have beaten the startup answer
                if self.phase == PanelPhase::Idle {
                    self.show_error(NO_TARGET_MESSAGE.to_string());
                }
            }
            PanelAction::Poll(Some(url)) => {
                if self.last_loaded_url.as_deref() != Some(url.as_str()) {
                    log::info!("Detected URL change from periodic check");
                    self.load_target_url(&url);
                }
            }
            PanelAction::Poll(None) => {}
            PanelAction::FrameLoaded => {
                if self.phase == PanelPhase::Loading {
                    log::info!("Documentation content loaded successfully");
                    self.phase = PanelPhase::Loaded;
                }
            }
            PanelAction::FrameFailed(detail) => {
                self.show_error(format!("Failed to load documentation content: {}", detail));
            }
        }
    }
}

impl Reducible for PanelState {
    type Action = PanelAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        if next == *self { self } else { Rc::new(next) }
    }
}

/// Ask the background for the current target URL. Errors and missing
/// answers both come back as `None`.
pub async fn request_target_url<B: MessageBus>(bus: &B) -> Option<String> {
    match bus.request(&ExtensionMessage::GetTargetUrl).await {
        Ok(response) => TargetUrlResponse::into_url(response),
        Err(e) => {
            log::warn!("Target URL request failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use futures::executor::block_on;

    const URL_A: &str = "https://deepwiki.com/foo/bar";
    const URL_B: &str = "https://deepwiki.com/rust-lang/rust";

    fn create_test_loaded(url: &str) -> PanelState {
        let mut state = PanelState::default();
        state.apply(PanelAction::Load(url.to_string()));
        state.apply(PanelAction::FrameLoaded);
        state
    }

    #[test]
    fn test_load_then_frame_success() {
        let mut state = PanelState::default();
        assert_eq!(state.phase, PanelPhase::Idle);

        state.apply(PanelAction::Load(URL_A.to_string()));
        assert_eq!(state.phase, PanelPhase::Loading);
        assert!(state.is_loading());
        assert!(!state.is_frame_visible());
        assert_eq!(state.frame_src.as_deref(), Some(URL_A));

        state.apply(PanelAction::FrameLoaded);
        assert_eq!(state.phase, PanelPhase::Loaded);
        assert!(state.is_frame_visible());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_same_url_while_visible_assigns_once() {
        let mut state = create_test_loaded(URL_A);
        assert_eq!(state.src_assignments, 1);

        assert!(!state.load_target_url(URL_A));
        state.apply(PanelAction::Load(URL_A.to_string()));

        assert_eq!(state.src_assignments, 1);
        assert_eq!(state.phase, PanelPhase::Loaded);
    }

    #[test]
    fn test_same_url_while_loading_reassigns() {
        let mut state = PanelState::default();
        assert!(state.load_target_url(URL_A));
        assert!(state.load_target_url(URL_A));
        assert_eq!(state.src_assignments, 2);
    }

    #[test]
    fn test_new_url_after_loaded_goes_back_to_loading() {
        let mut state = create_test_loaded(URL_A);

        state.apply(PanelAction::Load(URL_B.to_string()));

        assert_eq!(state.phase, PanelPhase::Loading);
        assert_eq!(state.last_loaded_url.as_deref(), Some(URL_B));
        assert_eq!(state.src_assignments, 2);
    }

    #[test]
    fn test_frame_failure_shows_detail() {
        let mut state = PanelState::default();
        state.apply(PanelAction::Load(URL_A.to_string()));
        state.apply(PanelAction::FrameFailed("net::ERR_BLOCKED_BY_RESPONSE".to_string()));

        assert_eq!(
            state.error(),
            Some("Failed to load documentation content: net::ERR_BLOCKED_BY_RESPONSE")
        );
        assert!(!state.is_loading());
        assert!(!state.is_frame_visible());

        // A late load event does not hide the error
        state.apply(PanelAction::FrameLoaded);
        assert!(state.error().is_some());

        // The same URL may be retried from the error state
        state.apply(PanelAction::Load(URL_A.to_string()));
        assert_eq!(state.phase, PanelPhase::Loading);
    }

    #[test]
    fn test_startup_without_target_is_error() {
        let mut state = PanelState::default();
        state.apply(PanelAction::Startup(None));

        assert_eq!(state.error(), Some(NO_TARGET_MESSAGE));
        assert_eq!(state.frame_src, None);
        assert_eq!(state.src_assignments, 0);
    }

    #[test]
    fn test_startup_without_target_after_push_keeps_push() {
        let mut state = PanelState::default();
        state.apply(PanelAction::Load(URL_A.to_string()));
        state.apply(PanelAction::Startup(None));

        assert_eq!(state.phase, PanelPhase::Loading);
    }

    #[test]
    fn test_startup_and_push_of_same_url_render_once() {
        let mut state = PanelState::default();
        state.apply(PanelAction::Startup(Some(URL_A.to_string())));
        state.apply(PanelAction::FrameLoaded);
        state.apply(PanelAction::Load(URL_A.to_string()));
        state.apply(PanelAction::Poll(Some(URL_A.to_string())));

        assert_eq!(state.src_assignments, 1);
        assert!(state.is_frame_visible());
    }

    #[test]
    fn test_poll_only_loads_changed_url() {
        let mut state = create_test_loaded(URL_A);

        state.apply(PanelAction::Poll(None));
        state.apply(PanelAction::Poll(Some(URL_A.to_string())));
        assert_eq!(state.src_assignments, 1);

        state.apply(PanelAction::Poll(Some(URL_B.to_string())));
        assert_eq!(state.src_assignments, 2);
        assert_eq!(state.frame_src.as_deref(), Some(URL_B));
    }

    #[test]
    fn test_empty_url_is_ignored() {
        let mut state = PanelState::default();
        state.apply(PanelAction::Load(String::new()));
        assert_eq!(state, PanelState::default());
    }

    #[test]
    fn test_reducer_keeps_unchanged_state() {
        let state = Rc::new(create_test_loaded(URL_A));
        let next = state.clone().reduce(PanelAction::Load(URL_A.to_string()));
        assert!(Rc::ptr_eq(&state, &next));

        let next = state.clone().reduce(PanelAction::Load(URL_B.to_string()));
        assert!(!Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_request_target_url() {
        let host = FakeHost::new();
        assert_eq!(block_on(request_target_url(&host)), None);

        *host.response.borrow_mut() = Some(TargetUrlResponse { url: None });
        assert_eq!(block_on(request_target_url(&host)), None);

        *host.response.borrow_mut() = Some(TargetUrlResponse {
            url: Some(URL_A.to_string()),
        });
        assert_eq!(block_on(request_target_url(&host)), Some(URL_A.to_string()));
        assert_eq!(host.requests.borrow().len(), 3);
        assert_eq!(host.requests.borrow()[0], ExtensionMessage::GetTargetUrl);
    }
}
