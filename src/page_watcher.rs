/// Content script: watches the repository page for navigation and reports
/// each repository transition to the background coordinator.
use crate::chrome::{ChromeHost, Interval, sleep};
use crate::config::ExtensionConfig;
use crate::host::MessageBus;
use crate::messages::{ExtensionMessage, RepositoryObserved};
use crate::repository::{Classifier, RepositoryIdentity};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{MutationObserver, MutationObserverInit};

/// What made the watcher look at the location again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
    InitialLoad,
    /// The client-rendered page swapped its content
    DomMutation,
    /// Back/forward
    HistoryPop,
    /// Fallback interval check
    Poll,
}

/// Location and identity bookkeeping for one page.
///
/// Two steps: `on_navigation` decides whether (and how long after) to look
/// again, `settle` reclassifies and yields a report only when the identity
/// actually changed. Both are idempotent, so the event paths and the poll
/// can interleave freely.
#[derive(Debug, Clone)]
pub struct PageWatcher {
    classifier: Classifier,
    settle_delay_ms: u32,
    last_location: Option<String>,
    last_reported: Option<RepositoryIdentity>,
}

impl PageWatcher {
    pub fn new(classifier: Classifier, settle_delay_ms: u32) -> Self {
        PageWatcher {
            classifier,
            settle_delay_ms,
            last_location: None,
            last_reported: None,
        }
    }

    /// Returns the delay before `settle` should run, or `None` if the
    /// location has not moved.
    pub fn on_navigation(&mut self, location: &str, trigger: NavigationTrigger) -> Option<u32> {
        let changed = self.last_location.as_deref() != Some(location);

        let delay = match trigger {
            NavigationTrigger::InitialLoad => Some(0),
            NavigationTrigger::HistoryPop => Some(self.settle_delay_ms),
            NavigationTrigger::DomMutation if changed => Some(self.settle_delay_ms),
            // The page has had a whole poll period to render
            NavigationTrigger::Poll if changed => Some(0),
            NavigationTrigger::DomMutation | NavigationTrigger::Poll => None,
        };

        if delay.is_some() {
            if changed {
                log::debug!("Location changed to {} ({:?})", location, trigger);
            }
            self.last_location = Some(location.to_string());
        }
        delay
    }

    /// Reclassify `location`; a report comes back only on an identity change
    pub fn settle(&mut self, location: &str) -> Option<RepositoryObserved> {
        let resolved = self.classifier.resolve(location);
        let identity = resolved.as_ref().map(|(identity, _)| identity.clone());

        if identity == self.last_reported {
            return None;
        }
        self.last_reported = identity;

        let (identity, target_url) = resolved?;
        Some(RepositoryObserved {
            identity,
            target_url,
            source_url: location.to_string(),
        })
    }

    pub fn last_reported(&self) -> Option<&RepositoryIdentity> {
        self.last_reported.as_ref()
    }
}

/// Settle `watcher` at `location` and send the report, if any
pub async fn settle_and_report<B: MessageBus>(
    watcher: &RefCell<PageWatcher>,
    bus: &B,
    location: &str,
) -> bool {
    let Some(observed) = watcher.borrow_mut().settle(location) else {
        return false;
    };

    let identity = observed.identity.clone();
    match bus.send(&ExtensionMessage::UpdateTargetUrl { data: observed }).await {
        Ok(()) => log::info!("Sent repository info to background: {}", identity),
        Err(e) => log::warn!("Could not report {} to background: {}", identity, e),
    }
    true
}

fn current_location() -> Option<String> {
    web_sys::window().and_then(|w| w.location().href().ok())
}

fn schedule(watcher: &Rc<RefCell<PageWatcher>>, host: &Rc<ChromeHost>, trigger: NavigationTrigger) {
    let Some(location) = current_location() else {
        return;
    };
    let Some(delay) = watcher.borrow_mut().on_navigation(&location, trigger) else {
        return;
    };

    let watcher = watcher.clone();
    let host = host.clone();
    spawn_local(async move {
        if delay > 0 {
            sleep(delay).await;
        }
        // Read again: the app may have routed further while we waited
        if let Some(location) = current_location() {
            settle_and_report(&watcher, host.as_ref(), &location).await;
        }
    });
}

/// Install the observers on the current document. They live as long as the page.
pub fn start(config: &ExtensionConfig) {
    let classifier = match Classifier::new(config) {
        Ok(classifier) => classifier,
        Err(e) => {
            log::error!("Content script disabled: {}", e);
            return;
        }
    };
    let Some(window) = web_sys::window() else {
        log::error!("Content script has no window");
        return;
    };

    let watcher = Rc::new(RefCell::new(PageWatcher::new(classifier, config.settle_delay_ms)));
    let host = Rc::new(ChromeHost::new(&config.storage_key));

    schedule(&watcher, &host, NavigationTrigger::InitialLoad);

    // Client-side routing swaps the DOM without a page load
    {
        let watcher = watcher.clone();
        let host = host.clone();
        let on_mutation = Closure::wrap(Box::new(move |_records: JsValue, _observer: JsValue| {
            schedule(&watcher, &host, NavigationTrigger::DomMutation);
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        match MutationObserver::new(on_mutation.as_ref().unchecked_ref()) {
            Ok(observer) => {
                let init = MutationObserverInit::new();
                init.set_child_list(true);
                init.set_subtree(true);
                if let Some(document) = window.document() {
                    if let Err(e) = observer.observe_with_options(&document, &init) {
                        log::warn!("Could not observe document: {:?}", e);
                    }
                }
            }
            Err(e) => log::warn!("MutationObserver unavailable: {:?}", e),
        }
        on_mutation.forget();
    }

    {
        let watcher = watcher.clone();
        let host = host.clone();
        let on_popstate = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            schedule(&watcher, &host, NavigationTrigger::HistoryPop);
        }) as Box<dyn FnMut(web_sys::Event)>);

        if let Err(e) =
            window.add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())
        {
            log::warn!("Could not listen for popstate: {:?}", e);
        }
        on_popstate.forget();
    }

    {
        let watcher = watcher.clone();
        let host = host.clone();
        match Interval::new(config.watcher_poll_ms, move || {
            schedule(&watcher, &host, NavigationTrigger::Poll);
        }) {
            Ok(interval) => interval.forget(),
            Err(e) => log::warn!("Fallback location poll not started: {}", e),
        }
    }

    log::info!("Repository page watcher initialized");
}
