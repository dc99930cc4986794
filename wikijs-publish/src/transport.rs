//! # Transport: the single network entry point
//!
//! Every request to the wiki goes through [`HttpTransport::request`]. It
//! - resolves the bearer token through a [`TokenStore`] before any I/O,
//! - trusts an extra CA certificate when one is configured (read on every request),
//! - always validates server certificates,
//! - buffers the whole body and classifies the response.

use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wikijs_publish_core::contract::TokenStore;
use wikijs_publish_core::{PublishError, PublishSettings};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A buffered 2xx response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    text: String,
    json: Option<Value>,
}

impl TransportResponse {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed body, `None` when the body was empty.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }
}

pub struct HttpTransport {
    settings: PublishSettings,
    tokens: Arc<dyn TokenStore>,
}

impl HttpTransport {
    pub fn new(settings: PublishSettings, tokens: Arc<dyn TokenStore>) -> Self {
        Self { settings, tokens }
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    fn bearer_token(&self) -> Result<String, PublishError> {
        let blob = self
            .settings
            .api_token
            .as_deref()
            .filter(|blob| !blob.trim().is_empty())
            .ok_or_else(|| PublishError::AuthError("API token is not configured".into()))?;
        self.tokens.decrypt(blob).map_err(|e| match e {
            PublishError::AuthError(_) => e,
            other => PublishError::AuthError(other.to_string()),
        })
    }

    fn build_client(&self) -> Result<reqwest::Client, PublishError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT);

        if let Some(ca_path) = &self.settings.ca_cert_path {
            let pem = std::fs::read(ca_path).map_err(|e| {
                tracing::error!(error = ?e, path = %ca_path.display(), "Failed to read CA certificate");
                PublishError::CertificateError(format!("cannot read {}: {e}", ca_path.display()))
            })?;
            let certificates = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                PublishError::CertificateError(format!("{} is not a PEM certificate: {e}", ca_path.display()))
            })?;
            if certificates.is_empty() {
                tracing::error!(path = %ca_path.display(), "CA file contains no certificate");
                return Err(PublishError::CertificateError(format!(
                    "{} contains no PEM certificate",
                    ca_path.display()
                )));
            }
            tracing::debug!(path = %ca_path.display(), count = certificates.len(), "Trusting custom CA certificates");
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        builder.build().map_err(|e| {
            PublishError::TransportError(format!("failed to build HTTP client: {e}"))
        })
    }

    /// Sends one authenticated request and buffers the response.
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        headers: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<TransportResponse, PublishError> {
        let token = self.bearer_token()?;
        let client = self.build_client()?;

        let mut request = client.request(method.clone(), url).bearer_auth(token);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url, method = %method, "Request failed before a response arrived");
            PublishError::TransportError(e.to_string())
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Failed to read response body");
            PublishError::TransportError(format!("failed to read response body: {e}"))
        })?;

        if self.settings.debug {
            tracing::info!(url, method = %method, status = status.as_u16(), body_len = text.len(), "[HTTP][DEBUG] Response received");
        }

        if !status.is_success() {
            tracing::error!(url, status = status.as_u16(), body = %text, "Server returned an error status");
            return Err(PublishError::HttpError {
                status: status.as_u16(),
                body: text,
            });
        }

        let json = if text.trim().is_empty() {
            None
        } else {
            let parsed = serde_json::from_str::<Value>(&text).map_err(|e| {
                tracing::error!(error = ?e, url, "Response body is not JSON");
                PublishError::ResponseFormatError(format!("invalid JSON from {url}: {e}"))
            })?;
            Some(parsed)
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            text,
            json,
        })
    }

    /// POSTs a GraphQL document to `<base>/graphql` and returns the decoded body.
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value, PublishError> {
        let url = self.settings.graphql_url();
        let body = json!({ "query": query, "variables": variables }).to_string();
        let response = self
            .request(
                &url,
                Method::POST,
                &[("Content-Type", "application/json"), ("Accept", "application/json")],
                Some(body),
            )
            .await?;
        response
            .json()
            .cloned()
            .ok_or_else(|| PublishError::ResponseFormatError("empty GraphQL response".into()))
    }
}
