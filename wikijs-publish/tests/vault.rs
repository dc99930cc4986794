use std::fs;
use tempfile::TempDir;
use wikijs_publish::vault::FsVault;
use wikijs_publish_core::contract::Vault;
use wikijs_publish_core::PublishError;

fn sample_vault() -> TempDir {
    let dir = TempDir::new().expect("temp vault");
    let root = dir.path();
    fs::create_dir_all(root.join("projects/rust")).unwrap();
    fs::create_dir_all(root.join(".obsidian")).unwrap();
    fs::write(root.join("b.md"), "B").unwrap();
    fs::write(root.join("a.md"), "A").unwrap();
    fs::write(root.join("projects/rust/Ownership.md"), "---\ntags: [rust, \"lang\"]\n---\nBorrowing #memory").unwrap();
    fs::write(root.join(".obsidian/workspace.md"), "hidden").unwrap();
    fs::write(root.join(".hidden.md"), "hidden").unwrap();
    fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
    dir
}

#[tokio::test]
async fn lists_markdown_sorted_and_skips_hidden() {
    let dir = sample_vault();
    let vault = FsVault::new(dir.path());
    let notes = vault.list_notes().await.expect("listing");
    assert_eq!(notes, vec!["a.md", "b.md", "projects/rust/Ownership.md"]);
}

#[tokio::test]
async fn reads_notes_and_their_tags() {
    let dir = sample_vault();
    let vault = FsVault::new(dir.path());
    assert_eq!(vault.read_note("a.md").await.unwrap(), "A");
    let tags = vault.note_tags("projects/rust/Ownership.md").await.unwrap();
    assert_eq!(tags, vec!["rust", "lang", "#memory"]);
}

#[tokio::test]
async fn missing_note_is_unreadable() {
    let dir = sample_vault();
    let vault = FsVault::new(dir.path());
    let err = vault.read_note("gone.md").await.unwrap_err();
    match err {
        PublishError::NoteUnreadable { path, .. } => assert_eq!(path, "gone.md"),
        other => panic!("expected NoteUnreadable, got {other:?}"),
    }
}

#[test]
fn load_note_uses_vault_relative_path_and_stem_title() {
    let dir = sample_vault();
    let vault = FsVault::new(dir.path());
    let note = vault
        .load_note(&dir.path().join("projects/rust/Ownership.md"))
        .expect("note loads");
    assert_eq!(note.path, "projects/rust/Ownership.md");
    assert_eq!(note.title, "Ownership");
    assert!(note.content.contains("Borrowing"));
}

#[tokio::test]
async fn differently_spelled_paths_still_resolve_inside_the_vault() {
    let dir = sample_vault();
    let vault = FsVault::new(dir.path().join("projects"));
    let note = vault
        .load_note(&dir.path().join("projects/../projects/rust/Ownership.md"))
        .expect("note loads");
    assert_eq!(note.path, "rust/Ownership.md");

    let tags = vault.note_tags(&note.path).await.expect("tags readable");
    assert_eq!(tags, vec!["rust", "lang", "#memory"]);
}

#[tokio::test]
#[serial_test::serial]
async fn working_directory_relative_note_matches_dotted_root() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("vault")).unwrap();
    fs::write(dir.path().join("vault/a.md"), "---\ntags: [alpha]\n---\nBody #beta").unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let vault = FsVault::new("./vault");
    let note = vault.load_note(std::path::Path::new("vault/a.md"));
    let tags = match &note {
        Ok(note) => vault.note_tags(&note.path).await,
        Err(_) => Ok(Vec::new()),
    };
    std::env::set_current_dir(previous).unwrap();

    let note = note.expect("note loads");
    assert_eq!(note.path, "a.md");
    assert_eq!(tags.expect("tags readable"), vec!["alpha", "#beta"]);
}
