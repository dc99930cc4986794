//! # contract: collaborator interfaces for the publish pipeline
//!
//! The pipeline never talks to the network, the filesystem or a credential store directly.
//! It goes through the three traits defined here:
//!
//! - [`WikiApi`]: the remote wiki (list pages, create page, update page).
//! - [`Vault`]: the note collection (enumerate notes, read a note, per-note tag metadata).
//! - [`TokenStore`]: opaque encrypt/decrypt of the API token.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can script remote responses and vault
//!   contents. Mocks are exported under the `test-export-mocks` feature for dependent crates.
//!
//! ## Implementations
//! - The `wikijs-publish` crate implements [`WikiApi`] over GraphQL, [`Vault`] over a
//!   directory of markdown files and [`TokenStore`] as a reversible encoding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::PublishError;

/// A page as listed by the remote wiki.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePage {
    pub id: i64,
    /// Unique addressable slug, e.g. `notes/my-page`.
    pub path: String,
    pub title: String,
}

/// Payload of a create or update mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    pub content: String,
    pub description: String,
    pub editor: String,
    pub is_published: bool,
    pub is_private: bool,
    pub locale: String,
    pub path: String,
    pub tags: Vec<String>,
    pub title: String,
}

impl PageInput {
    /// A published, public markdown page in locale `en`, described by its own title.
    pub fn markdown(path: String, title: String, content: String, tags: Vec<String>) -> Self {
        Self {
            content,
            description: title.clone(),
            editor: "markdown".to_string(),
            is_published: true,
            is_private: false,
            locale: "en".to_string(),
            path,
            tags,
            title,
        }
    }
}

/// The `responseResult` block of a mutation, plus the page id a create returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationResult {
    pub succeeded: bool,
    pub error_code: i64,
    pub message: Option<String>,
    pub page_id: Option<i64>,
}

/// The remote wiki.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Every page on the server in one response.
    async fn list_pages(&self) -> Result<Vec<RemotePage>, PublishError>;

    async fn create_page(&self, input: &PageInput) -> Result<MutationResult, PublishError>;

    /// Updates the page with `id` in place.
    async fn update_page(&self, id: i64, input: &PageInput)
        -> Result<MutationResult, PublishError>;
}

/// The note collection owned by the host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Vault: Send + Sync {
    /// All note paths in the host's enumeration order.
    async fn list_notes(&self) -> Result<Vec<String>, PublishError>;

    /// Raw note text, front matter included.
    async fn read_note(&self, path: &str) -> Result<String, PublishError>;

    /// Tags the host has indexed for the note (front matter and inline), with or without a
    /// leading `#`.
    async fn note_tags(&self, path: &str) -> Result<Vec<String>, PublishError>;
}

/// Opaque credential storage. Both directions may fail.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TokenStore: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, PublishError>;
    fn decrypt(&self, blob: &str) -> Result<String, PublishError>;
}
