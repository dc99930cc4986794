//! Error taxonomy shared by the publish pipeline and its collaborators.
//!
//! Rejections that are part of normal operation (note not marked for publishing, empty
//! content, ...) are not errors; see [`crate::publish::RejectReason`].

/// Every failure the pipeline can surface.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// Bad or missing base URL, missing CA file, empty front-matter key names.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// API token absent or not decryptable. Raised before any network call.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Custom CA certificate could not be read or parsed.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// DNS, connection or TLS handshake failure.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Non-2xx response.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// 2xx response whose body is not valid JSON.
    #[error("Malformed response: {0}")]
    ResponseFormatError(String),

    /// Page listing did not have the expected shape.
    #[error("Failed to fetch remote pages: {0}")]
    RemoteFetchError(String),

    /// Create or update reported `succeeded: false`.
    #[error("Remote mutation failed: {message}")]
    RemoteMutationFailure { message: String },

    #[error("Could not read note {path}: {reason}")]
    NoteUnreadable { path: String, reason: String },
}

impl PublishError {
    /// Short, stable label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::ConfigInvalid(_) => "config_invalid",
            PublishError::AuthError(_) => "auth",
            PublishError::CertificateError(_) => "certificate",
            PublishError::TransportError(_) => "transport",
            PublishError::HttpError { .. } => "http",
            PublishError::ResponseFormatError(_) => "response_format",
            PublishError::RemoteFetchError(_) => "remote_fetch",
            PublishError::RemoteMutationFailure { .. } => "remote_mutation",
            PublishError::NoteUnreadable { .. } => "note_unreadable",
        }
    }
}
