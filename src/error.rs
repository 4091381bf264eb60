/// Error types for the extension's host interactions
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtensionError {
    /// The host refused to open the side panel (e.g. no user gesture)
    #[error("Side panel could not be opened: {0}")]
    PanelOpenDenied(String),

    /// A chrome.* call through the JS bridge threw or rejected
    #[error("Browser API call failed: {0}")]
    Bridge(String),

    /// A value could not cross the JS boundary
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ExtensionError>;
