/// Repository page classification and documentation URL derivation
use crate::config::ExtensionConfig;
use crate::error::{ExtensionError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Owner and name of a repository, taken from its root page URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The one rule deciding whether a URL is a repository root page.
///
/// Matches exactly `https://<host>/<owner>/<name>` with an optional trailing
/// slash. Each segment is non-empty and may not contain `/`, `?`, `#` or
/// whitespace, so sub-pages, query strings and fragments are all rejected.
#[derive(Debug, Clone)]
pub struct Classifier {
    pattern: Regex,
    docs_base: String,
}

impl Classifier {
    pub fn new(config: &ExtensionConfig) -> Result<Self> {
        let source = format!(
            r"^https://{}/([^/?#\s]+)/([^/?#\s]+)/?$",
            regex::escape(&config.code_host)
        );
        let pattern = Regex::new(&source)
            .map_err(|e| ExtensionError::InvalidConfig(format!("host pattern: {}", e)))?;

        Ok(Classifier {
            pattern,
            docs_base: config.docs_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn classify(&self, url: &str) -> Option<RepositoryIdentity> {
        let captures = self.pattern.captures(url)?;
        Some(RepositoryIdentity {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    /// Plain substitution into the documentation template. Segments already
    /// exclude every character that would need escaping in a path.
    pub fn target_url(&self, identity: &RepositoryIdentity) -> String {
        format!("{}/{}/{}", self.docs_base, identity.owner, identity.name)
    }

    /// Classify and derive in one step
    pub fn resolve(&self, url: &str) -> Option<(RepositoryIdentity, String)> {
        self.classify(url).map(|identity| {
            let target = self.target_url(&identity);
            (identity, target)
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(&ExtensionConfig::default())
        .expect("default host pattern is a valid regex")
});

/// Classify a URL with the default configuration
pub fn classify(url: &str) -> Option<RepositoryIdentity> {
    DEFAULT_CLASSIFIER.classify(url)
}

/// Documentation URL for a repository with the default configuration
pub fn target_url(identity: &RepositoryIdentity) -> String {
    DEFAULT_CLASSIFIER.target_url(identity)
}
