//! High-level pipeline: turns notes into Wiki.js pages.
//!
//! Single-note flow ([`publish_note`]):
//!   1. validate settings
//!   2. parse front matter and check the publish flag
//!   3. strip front matter, reject blank content
//!   4. fetch the remote page listing once, rewrite wiki links against it
//!   5. resolve tags, compute the target path (`<prefix>/<slug of title>`)
//!   6. update the page at that path if it exists, create it otherwise
//!
//! Bulk flow ([`publish_all`]) scans the whole vault for flagged notes, then runs steps 3–6
//! for each of them strictly one after another with a fixed pause in between. A failing
//! note is counted and the run moves on.
//!
//! # Error Handling
//! Normal rejections are [`RejectReason`]s. Failures carry the [`PublishError`] that ended
//! the note's run. Every failure is logged here; callers only have to report outcomes.

use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::PublishSettings;
use crate::contract::{MutationResult, PageInput, Vault, WikiApi};
use crate::directory::PageDirectory;
use crate::error::PublishError;
use crate::frontmatter::{self, FrontMatter};
use crate::tags::publish_tags;
use crate::transform::{convert_links, remove_front_matter, slugify};

/// Settings and collaborators for one publish operation.
pub struct PublishContext<'a, A: WikiApi + ?Sized, V: Vault + ?Sized> {
    pub settings: &'a PublishSettings,
    pub api: &'a A,
    pub vault: &'a V,
}

impl<'a, A: WikiApi + ?Sized, V: Vault + ?Sized> PublishContext<'a, A, V> {
    pub fn new(settings: &'a PublishSettings, api: &'a A, vault: &'a V) -> Self {
        Self {
            settings,
            api,
            vault,
        }
    }
}

/// A note as handed over by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Vault-relative path, e.g. `projects/Release Plan.md`.
    pub path: String,
    pub title: String,
    /// Raw text including front matter.
    pub content: String,
}

impl Note {
    /// A note titled after its file stem.
    pub fn from_path(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            title: title_from_path(&path),
            path,
            content: content.into(),
        }
    }
}

pub fn title_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Why a note (or a whole run) was not published. Informational, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    ConfigInvalid(String),
    NotMarked,
    EmptyContent,
    /// The note title has no characters a slug can keep.
    UntitledNote,
    /// No note in the vault is marked; `unreadable` counts notes the scan could not read.
    NothingToPublish { unreadable: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ConfigInvalid(reason) => write!(f, "configuration is invalid: {reason}"),
            RejectReason::NotMarked => f.write_str("note is not marked for publishing"),
            RejectReason::EmptyContent => f.write_str("note has no content besides front matter"),
            RejectReason::UntitledNote => f.write_str("note title cannot be turned into a page path"),
            RejectReason::NothingToPublish { unreadable: 0 } => {
                f.write_str("no notes are marked for publishing")
            }
            RejectReason::NothingToPublish { unreadable } => write!(
                f,
                "no notes are marked for publishing ({unreadable} could not be read)"
            ),
        }
    }
}

/// Terminal state of one note.
#[derive(Debug)]
pub enum PublishOutcome {
    Created { path: String, id: Option<i64> },
    Updated { path: String, id: i64 },
    Rejected(RejectReason),
    Failed(PublishError),
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(
            self,
            PublishOutcome::Created { .. } | PublishOutcome::Updated { .. }
        )
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Created { path, .. } => write!(f, "created /{path}"),
            PublishOutcome::Updated { path, .. } => write!(f, "updated /{path}"),
            PublishOutcome::Rejected(reason) => write!(f, "skipped: {reason}"),
            PublishOutcome::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

#[derive(Debug)]
pub struct NoteReport {
    pub path: String,
    pub outcome: PublishOutcome,
}

/// Accounting of a bulk run. Counts cover every note that was read or queued.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub published: usize,
    pub errors: usize,
    pub notes: Vec<NoteReport>,
}

impl BulkReport {
    pub fn summary(&self) -> String {
        if self.errors == 0 {
            format!("Published {} notes", self.published)
        } else {
            format!(
                "Published {} notes, {} failed",
                self.published, self.errors
            )
        }
    }

    fn record(&mut self, path: &str, outcome: PublishOutcome) {
        if outcome.is_published() {
            self.published += 1;
        } else {
            self.errors += 1;
        }
        self.notes.push(NoteReport {
            path: path.to_string(),
            outcome,
        });
    }
}

#[derive(Debug)]
pub enum BulkOutcome {
    Completed(BulkReport),
    Rejected(RejectReason),
    /// The vault could not be enumerated.
    Failed(PublishError),
}

/// Publishes one note (the host's active note).
pub async fn publish_note<A, V>(ctx: &PublishContext<'_, A, V>, note: &Note) -> PublishOutcome
where
    A: WikiApi + ?Sized,
    V: Vault + ?Sized,
{
    info!(note = %note.path, "[PUBLISH] Publishing note");
    if let Err(e) = ctx.settings.validate() {
        warn!(error = %e, "[PUBLISH] Refusing to publish with invalid settings");
        return PublishOutcome::Rejected(RejectReason::ConfigInvalid(e.to_string()));
    }

    let front_matter = frontmatter::extract(&note.content);
    if !frontmatter::is_publish_requested(&front_matter, &ctx.settings.publish_key) {
        info!(note = %note.path, key = %ctx.settings.publish_key, "[PUBLISH] Note not marked for publishing");
        return PublishOutcome::Rejected(RejectReason::NotMarked);
    }

    publish_marked(ctx, note, &front_matter).await
}

/// Scans the vault for flagged notes and publishes them one at a time.
pub async fn publish_all<A, V>(ctx: &PublishContext<'_, A, V>) -> BulkOutcome
where
    A: WikiApi + ?Sized,
    V: Vault + ?Sized,
{
    if let Err(e) = ctx.settings.validate() {
        warn!(error = %e, "[PUBLISH] Refusing bulk publish with invalid settings");
        return BulkOutcome::Rejected(RejectReason::ConfigInvalid(e.to_string()));
    }

    let paths = match ctx.vault.list_notes().await {
        Ok(paths) => paths,
        Err(e) => {
            error!(error = %e, "[PUBLISH][ERROR] Could not enumerate notes");
            return BulkOutcome::Failed(e);
        }
    };
    info!(notes = paths.len(), "[PUBLISH] Scanning vault for notes to publish");

    let mut report = BulkReport::default();
    let mut queue = Vec::new();
    for path in paths {
        match ctx.vault.read_note(&path).await {
            Ok(raw) => {
                let front_matter = frontmatter::extract(&raw);
                if frontmatter::is_publish_requested(&front_matter, &ctx.settings.publish_key) {
                    debug!(note = %path, "[PUBLISH] Queued note");
                    queue.push(path);
                }
            }
            Err(e) => {
                error!(note = %path, error = %e, "[PUBLISH][ERROR] Failed to read note during scan");
                report.record(&path, PublishOutcome::Failed(e));
            }
        }
    }

    if queue.is_empty() {
        info!(unreadable = report.errors, "[PUBLISH] Nothing to publish");
        return BulkOutcome::Rejected(RejectReason::NothingToPublish {
            unreadable: report.errors,
        });
    }
    info!(queued = queue.len(), "[PUBLISH] Starting bulk publish");

    for (position, path) in queue.iter().enumerate() {
        if position > 0 {
            tokio::time::sleep(ctx.settings.request_delay).await;
        }
        let outcome = match ctx.vault.read_note(path).await {
            Ok(raw) => {
                let note = Note::from_path(path.as_str(), raw);
                let front_matter = frontmatter::extract(&note.content);
                publish_marked(ctx, &note, &front_matter).await
            }
            Err(e) => {
                error!(note = %path, error = %e, "[PUBLISH][ERROR] Failed to read queued note");
                PublishOutcome::Failed(e)
            }
        };
        info!(note = %path, outcome = %outcome, "[PUBLISH] Note processed");
        report.record(path, outcome);
    }

    if report.errors > 0 {
        warn!(published = report.published, errors = report.errors, "[PUBLISH] Bulk publish finished with errors");
    } else {
        info!(published = report.published, "[PUBLISH] Bulk publish finished");
    }
    BulkOutcome::Completed(report)
}

/// Validates settings and asks the server for its page listing.
pub async fn check_connection<A>(settings: &PublishSettings, api: &A) -> Result<usize, PublishError>
where
    A: WikiApi + ?Sized,
{
    settings.validate()?;
    let pages = PageDirectory::new(api).list_all().await?;
    Ok(pages.len())
}

/// `<prefix>/<slug>` where the prefix comes from front matter with slashes trimmed.
pub fn target_path(front_matter: &FrontMatter, prefix_key: &str, title: &str) -> String {
    let slug = slugify(title);
    let prefix = front_matter
        .get(prefix_key)
        .map(|value| value.as_text().trim().trim_matches('/').to_string())
        .filter(|prefix| !prefix.is_empty());
    match prefix {
        Some(prefix) => format!("{prefix}/{slug}"),
        None => slug,
    }
}

/// Steps after the publish flag check: shared by single and bulk publishing.
async fn publish_marked<A, V>(
    ctx: &PublishContext<'_, A, V>,
    note: &Note,
    front_matter: &FrontMatter,
) -> PublishOutcome
where
    A: WikiApi + ?Sized,
    V: Vault + ?Sized,
{
    let content = remove_front_matter(&note.content);
    if content.trim().is_empty() {
        info!(note = %note.path, "[PUBLISH] Note is empty after front matter");
        return PublishOutcome::Rejected(RejectReason::EmptyContent);
    }
    if slugify(&note.title).is_empty() {
        warn!(note = %note.path, title = %note.title, "[PUBLISH] Note title yields an empty slug");
        return PublishOutcome::Rejected(RejectReason::UntitledNote);
    }

    match push_page(ctx, note, front_matter, &content).await {
        Ok(outcome) => {
            info!(note = %note.path, outcome = %outcome, "[PUBLISH] Note published");
            outcome
        }
        Err(e) => {
            error!(note = %note.path, kind = e.kind(), error = %e, "[PUBLISH][ERROR] Publishing failed");
            PublishOutcome::Failed(e)
        }
    }
}

async fn push_page<A, V>(
    ctx: &PublishContext<'_, A, V>,
    note: &Note,
    front_matter: &FrontMatter,
    content: &str,
) -> Result<PublishOutcome, PublishError>
where
    A: WikiApi + ?Sized,
    V: Vault + ?Sized,
{
    let listing = PageDirectory::new(ctx.api).snapshot().await?;
    let converted = convert_links(content, &listing.slug_index());
    let tags = resolve_tags(ctx, &note.path).await;
    let path = target_path(front_matter, &ctx.settings.path_prefix_key, &note.title);
    let input = PageInput::markdown(path.clone(), note.title.clone(), converted, tags);

    if ctx.settings.debug {
        info!(
            note = %note.path,
            path = %input.path,
            tags = ?input.tags,
            content_len = input.content.len(),
            "[PUBLISH][DEBUG] Prepared page payload"
        );
    }

    match listing.find_by_path(&path) {
        Some(existing) => {
            info!(path = %path, id = existing.id, "[PUBLISH] Updating existing page");
            let result = ctx.api.update_page(existing.id, &input).await?;
            ensure_succeeded(result)?;
            Ok(PublishOutcome::Updated {
                path,
                id: existing.id,
            })
        }
        None => {
            info!(path = %path, "[PUBLISH] Creating new page");
            let result = ensure_succeeded(ctx.api.create_page(&input).await?)?;
            Ok(PublishOutcome::Created {
                path,
                id: result.page_id,
            })
        }
    }
}

async fn resolve_tags<A, V>(ctx: &PublishContext<'_, A, V>, note_path: &str) -> Vec<String>
where
    A: WikiApi + ?Sized,
    V: Vault + ?Sized,
{
    if !ctx.settings.sync_tags {
        return publish_tags(&ctx.settings.default_tags, Vec::<String>::new());
    }
    match ctx.vault.note_tags(note_path).await {
        Ok(note_tags) => publish_tags(&ctx.settings.default_tags, note_tags),
        Err(e) => {
            warn!(note = %note_path, error = %e, "[PUBLISH] Tag metadata unavailable, using default tags only");
            publish_tags(&ctx.settings.default_tags, Vec::<String>::new())
        }
    }
}

fn ensure_succeeded(result: MutationResult) -> Result<MutationResult, PublishError> {
    if result.succeeded {
        return Ok(result);
    }
    let message = result
        .message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("error code {}", result.error_code));
    Err(PublishError::RemoteMutationFailure { message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_path_joins_trimmed_prefix_and_slug() {
        let fm = frontmatter::extract("---\nwikijs_path: /projects/2024/\n---\n");
        assert_eq!(target_path(&fm, "wikijs_path", "Release Plan"), "projects/2024/release-plan");
    }

    #[test]
    fn target_path_without_prefix_is_the_slug() {
        let fm = frontmatter::extract("---\nwikijs_path:   \n---\n");
        assert_eq!(target_path(&fm, "wikijs_path", "Release Plan"), "release-plan");
        assert_eq!(target_path(&FrontMatter::default(), "wikijs_path", "A b"), "a-b");
    }

    #[test]
    fn numeric_prefix_renders_as_integer() {
        let fm = frontmatter::extract("---\nwikijs_path: 2024\n---\n");
        assert_eq!(target_path(&fm, "wikijs_path", "Notes"), "2024/notes");
    }

    #[test]
    fn title_comes_from_file_stem() {
        assert_eq!(title_from_path("projects/Release Plan.md"), "Release Plan");
        assert_eq!(title_from_path("Inbox.md"), "Inbox");
    }

    #[test]
    fn unsuccessful_mutation_uses_remote_message_or_code() {
        let err = ensure_succeeded(MutationResult {
            succeeded: false,
            error_code: 6002,
            message: Some("Page already exists".into()),
            page_id: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Remote mutation failed: Page already exists");

        let err = ensure_succeeded(MutationResult {
            succeeded: false,
            error_code: 42,
            message: None,
            page_id: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("error code 42"));
    }

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let mut report = BulkReport::default();
        report.record("a.md", PublishOutcome::Updated { path: "a".into(), id: 1 });
        assert_eq!(report.summary(), "Published 1 notes");
        report.record("b.md", PublishOutcome::Rejected(RejectReason::EmptyContent));
        assert_eq!(report.summary(), "Published 1 notes, 1 failed");
    }
}
