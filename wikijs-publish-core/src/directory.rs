//! Read-only view of the remote page tree.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::contract::{RemotePage, WikiApi};
use crate::error::PublishError;

/// Pages keyed by the last `/` segment of their path.
pub type SlugIndex = HashMap<String, RemotePage>;

/// One fetched page listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageListing {
    pub pages: Vec<RemotePage>,
}

impl PageListing {
    pub fn new(pages: Vec<RemotePage>) -> Self {
        Self { pages }
    }

    pub fn find_by_path(&self, path: &str) -> Option<&RemotePage> {
        self.pages.iter().find(|page| page.path == path)
    }

    /// Indexes pages by final path segment. When two pages share a segment the one listed
    /// last wins.
    pub fn slug_index(&self) -> SlugIndex {
        let mut index = SlugIndex::with_capacity(self.pages.len());
        for page in &self.pages {
            let segment = page.path.rsplit('/').next().unwrap_or_default();
            if let Some(previous) = index.insert(segment.to_string(), page.clone()) {
                debug!(segment, kept = %page.path, dropped = %previous.path, "Slug collision in page index");
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Remote page lookups. Every call refetches the full listing; use [`PageDirectory::snapshot`]
/// to reuse one fetch across several lookups.
pub struct PageDirectory<'a, A: WikiApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: WikiApi + ?Sized> PageDirectory<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn list_all(&self) -> Result<Vec<RemotePage>, PublishError> {
        let pages = self.api.list_pages().await?;
        info!(count = pages.len(), "Fetched remote page listing");
        Ok(pages)
    }

    pub async fn snapshot(&self) -> Result<PageListing, PublishError> {
        Ok(PageListing::new(self.list_all().await?))
    }

    pub async fn find_by_path(&self, path: &str) -> Result<Option<RemotePage>, PublishError> {
        Ok(self.snapshot().await?.find_by_path(path).cloned())
    }

    pub async fn build_slug_index(&self) -> Result<SlugIndex, PublishError> {
        Ok(self.snapshot().await?.slug_index())
    }
}
