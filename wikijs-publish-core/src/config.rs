use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::PublishError;

pub const DEFAULT_PUBLISH_KEY: &str = "wikijs_publish";
pub const DEFAULT_PATH_PREFIX_KEY: &str = "wikijs_path";
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Process-wide publisher settings. Loaded once, handed to every pipeline stage through
/// [`crate::publish::PublishContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSettings {
    /// Wiki.js base URL without a trailing slash.
    pub base_url: String,
    /// Opaque token blob, readable only through a [`crate::contract::TokenStore`].
    pub api_token: Option<String>,
    pub default_tags: Vec<String>,
    pub publish_key: String,
    pub path_prefix_key: String,
    pub ca_cert_path: Option<PathBuf>,
    pub sync_tags: bool,
    pub debug: bool,
    /// Pause between successive notes in a bulk run.
    pub request_delay: Duration,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            default_tags: Vec::new(),
            publish_key: DEFAULT_PUBLISH_KEY.to_string(),
            path_prefix_key: DEFAULT_PATH_PREFIX_KEY.to_string(),
            ca_cert_path: None,
            sync_tags: false,
            debug: false,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

impl PublishSettings {
    /// Builds settings for `base_url`, stripping any trailing slashes.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalise_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// GraphQL endpoint of the configured server.
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), PublishError> {
        if self.base_url.trim().is_empty() {
            return Err(PublishError::ConfigInvalid("base URL is not set".into()));
        }
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            PublishError::ConfigInvalid(format!("base URL {:?} is not a valid URL: {e}", self.base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PublishError::ConfigInvalid(format!(
                "base URL must use http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.publish_key.trim().is_empty() {
            return Err(PublishError::ConfigInvalid("publish key name is empty".into()));
        }
        if self.path_prefix_key.trim().is_empty() {
            return Err(PublishError::ConfigInvalid("path prefix key name is empty".into()));
        }
        if let Some(ca) = &self.ca_cert_path {
            if !ca.is_file() {
                return Err(PublishError::ConfigInvalid(format!(
                    "CA certificate file {} does not exist",
                    ca.display()
                )));
            }
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            base_url = %self.base_url,
            token_set = self.api_token.is_some(),
            default_tags = self.default_tags.len(),
            sync_tags = self.sync_tags,
            custom_ca = self.ca_cert_path.is_some(),
            "Loaded publish settings"
        );
        debug!(
            publish_key = %self.publish_key,
            path_prefix_key = %self.path_prefix_key,
            delay_ms = self.request_delay.as_millis() as u64,
            "Publish settings (full debug)"
        );
    }
}

pub fn normalise_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
