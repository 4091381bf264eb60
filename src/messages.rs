/// Messages exchanged between the background worker, content script and panel
use crate::repository::RepositoryIdentity;
use serde::{Deserialize, Serialize};

/// Payload of a "repository observed" notification from the content script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryObserved {
    pub identity: RepositoryIdentity,
    #[serde(rename = "targetURL")]
    pub target_url: String,
    /// Full location of the page that produced the identity
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

/// Every message on the runtime bus, tagged by its `action` field.
///
/// Only `GetTargetUrl` expects an answer (a `TargetUrlResponse`); the other
/// two are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ExtensionMessage {
    #[serde(rename = "updateTargetURL")]
    UpdateTargetUrl { data: RepositoryObserved },

    #[serde(rename = "getTargetURL")]
    GetTargetUrl,

    #[serde(rename = "loadTargetURL")]
    LoadTargetUrl { url: String },
}

impl ExtensionMessage {
    pub fn expects_response(&self) -> bool {
        matches!(self, ExtensionMessage::GetTargetUrl)
    }

    /// Decode a raw bus message. Anything unrecognized, including a known
    /// action with a missing payload, yields `None` and is ignored by callers.
    pub fn decode(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                log::debug!("Ignoring unrecognized message {}: {}", value, e);
                None
            }
        }
    }
}

/// Answer to `getTargetURL`; `url` is absent when nothing has been stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetUrlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TargetUrlResponse {
    /// Collapse "no response" and "empty response" into one case
    pub fn into_url(response: Option<Self>) -> Option<String> {
        response
            .and_then(|r| r.url)
            .filter(|url| !url.is_empty())
    }
}
