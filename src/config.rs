/// Extension configuration: hosts, storage key, timings
use crate::error::{ExtensionError, Result};
use url::Url;

/// Fixed settings shared by the background worker, content script and panel.
///
/// Nothing here is persisted. Every context builds it through `for_entry`
/// from `Default`, so all three agree on the host rule and the storage key.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionConfig {
    /// Code-hosting domain whose repository root pages are recognized
    pub code_host: String,
    /// Documentation service base, without trailing slash
    pub docs_base: String,
    /// The single SharedSlot key holding the current target URL
    pub storage_key: String,
    /// Panel document registered with the side panel surface
    pub panel_path: String,
    /// Wait after a navigation before reclassifying the page
    pub settle_delay_ms: u32,
    /// Content script fallback location check
    pub watcher_poll_ms: u32,
    /// Side panel fallback target URL check
    pub panel_poll_ms: u32,
}

impl ExtensionConfig {
    /// Replace the documentation base, rejecting anything that is not an
    /// absolute http(s) URL with a host.
    pub fn with_docs_base(mut self, base: &str) -> Result<Self> {
        let parsed = Url::parse(base)
            .map_err(|e| ExtensionError::InvalidConfig(format!("docs base {}: {}", base, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ExtensionError::InvalidConfig(format!(
                "docs base must be an http(s) URL with a host: {}",
                base
            )));
        }

        self.docs_base = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Configuration for an entry point. `docs_base` is the optional override
    /// passed from the loader script; `None` or blank keeps the default.
    pub fn for_entry(docs_base: Option<&str>) -> Result<Self> {
        match docs_base.map(str::trim).filter(|base| !base.is_empty()) {
            Some(base) => ExtensionConfig::default().with_docs_base(base),
            None => Ok(ExtensionConfig::default()),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        ExtensionConfig {
            code_host: "github.com".to_string(),
            docs_base: "https://deepwiki.com".to_string(),
            storage_key: "targetURL".to_string(),
            panel_path: "sidepanel.html".to_string(),
            settle_delay_ms: 500,
            watcher_poll_ms: 2000,
            panel_poll_ms: 5000,
        }
    }
}
