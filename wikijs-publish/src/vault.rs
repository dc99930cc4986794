//! A vault backed by a directory of markdown files.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use wikijs_publish_core::contract::Vault;
use wikijs_publish_core::publish::Note;
use wikijs_publish_core::tags::note_tags_from_text;
use wikijs_publish_core::PublishError;

pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault-relative, `/`-separated path for `file`; files outside the vault keep the
    /// path they were given. Both paths are canonicalized when they exist, so `vault/a.md`
    /// and a root of `./vault` agree.
    pub fn relative_path(&self, file: &Path) -> String {
        let canonical = fs::canonicalize(&self.root)
            .and_then(|root| fs::canonicalize(file).map(|file| (root, file)));
        let relative = match &canonical {
            Ok((root, full)) => full.strip_prefix(root).ok(),
            Err(_) => None,
        }
        .or_else(|| file.strip_prefix(&self.root).ok())
        .unwrap_or(file);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Loads a note from disk as the host would hand over its active note.
    pub fn load_note(&self, file: &Path) -> Result<Note, PublishError> {
        let content = fs::read_to_string(file).map_err(|e| PublishError::NoteUnreadable {
            path: file.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Note::from_path(self.relative_path(file), content))
    }

    fn read(&self, path: &str) -> Result<String, PublishError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|e| {
            error!(error = ?e, path = %full.display(), "Failed to read note");
            PublishError::NoteUnreadable {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

fn visit_dir(dir: &Path, results: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            debug!(path = %path.display(), "Skipping hidden entry");
            continue;
        }
        if path.is_dir() {
            visit_dir(&path, results)?;
        } else if path.extension().map_or(false, |ext| ext == "md") {
            results.push(path);
        }
    }
    Ok(())
}

#[async_trait]
impl Vault for FsVault {
    /// Markdown files under the root, sorted by path; hidden files and directories skipped.
    async fn list_notes(&self) -> Result<Vec<String>, PublishError> {
        let mut files = Vec::new();
        visit_dir(&self.root, &mut files).map_err(|e| PublishError::NoteUnreadable {
            path: self.root.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut notes: Vec<String> = files.iter().map(|f| self.relative_path(f)).collect();
        notes.sort();
        debug!(count = notes.len(), root = %self.root.display(), "Enumerated vault notes");
        Ok(notes)
    }

    async fn read_note(&self, path: &str) -> Result<String, PublishError> {
        self.read(path)
    }

    async fn note_tags(&self, path: &str) -> Result<Vec<String>, PublishError> {
        Ok(note_tags_from_text(&self.read(path)?))
    }
}
