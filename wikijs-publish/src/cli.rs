///
/// This module implements the CLI for wikijs-publish: command parsing, wiring the
/// concrete collaborators together, and user-visible output.
///
/// All publishing rules (front matter, links, page lookup, bulk pacing) live in the
/// [`wikijs-publish-core`] crate. This module is strictly glue.
///
/// ## Commands
/// - `publish` publishes a single note, the way a host hands over its active note.
/// - `publish-all` scans the vault and publishes every note marked for publishing.
/// - `check` validates settings and fetches the page listing once.
/// - `encrypt-token` stores an API token in the config file.
///
/// For programmatic and integration use, call [`run`] with a constructed [`Cli`].
///
/// [`wikijs-publish-core`]: ../../wikijs-publish-core/
use crate::client::WikiJsClient;
use crate::load_config::{load_config, save_config, CliConfig};
use crate::token::Base64TokenStore;
use crate::transport::HttpTransport;
use crate::vault::FsVault;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wikijs_publish_core::contract::TokenStore;
use wikijs_publish_core::publish::{
    check_connection, publish_all, publish_note, BulkOutcome, PublishContext, PublishOutcome,
};

/// CLI for wikijs-publish: push markdown notes to a Wiki.js server.
#[derive(Parser)]
#[clap(
    name = "wikijs-publish",
    version,
    about = "Publish markdown notes to a Wiki.js instance over its GraphQL API"
)]
pub struct Cli {
    /// Log request details and raise verbosity
    #[clap(long, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish a single note if it is marked for publishing
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Note file, absolute or relative to the working directory or vault root
        note: PathBuf,
    },
    /// Publish every marked note in the vault, one at a time
    PublishAll {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Validate settings and test the connection to the wiki
    Check {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Store an API token in the config file
    EncryptToken {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// The API token as issued by Wiki.js
        token: String,
    },
}

fn load(config: &Path, debug: bool) -> Result<CliConfig> {
    let mut loaded = load_config(config)?;
    loaded.settings.debug |= debug;
    Ok(loaded)
}

fn wiki_client(config: &CliConfig) -> WikiJsClient {
    let tokens: Arc<dyn TokenStore> = Arc::new(Base64TokenStore);
    WikiJsClient::new(HttpTransport::new(config.settings.clone(), tokens))
}

fn resolve_note_path(vault_root: &Path, note: &Path) -> PathBuf {
    if note.is_relative() && !note.exists() {
        vault_root.join(note)
    } else {
        note.to_path_buf()
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish { config, note } => {
            let loaded = load(&config, cli.debug)?;
            tracing::info!(command = "publish", note = %note.display(), "Publishing note");
            let client = wiki_client(&loaded);
            let vault = FsVault::new(&loaded.vault_root);
            let note_path = resolve_note_path(vault.root(), &note);
            let note = vault.load_note(&note_path)?;

            let ctx = PublishContext::new(&loaded.settings, &client, &vault);
            let outcome = publish_note(&ctx, &note).await;
            println!("{}: {outcome}", note.path);
            match outcome {
                PublishOutcome::Failed(e) => {
                    if let Err(flush) = save_config(&config, &loaded) {
                        tracing::warn!(error = %flush, "Could not save settings after failure");
                    }
                    tracing::error!(command = "publish", error = %e, "Publish failed");
                    Err(anyhow::Error::new(e).context(format!("Failed to publish {}", note.path)))
                }
                _ => Ok(()),
            }
        }
        Commands::PublishAll { config } => {
            let loaded = load(&config, cli.debug)?;
            tracing::info!(command = "publish-all", vault = %loaded.vault_root.display(), "Publishing vault");
            let client = wiki_client(&loaded);
            let vault = FsVault::new(&loaded.vault_root);

            let ctx = PublishContext::new(&loaded.settings, &client, &vault);
            match publish_all(&ctx).await {
                BulkOutcome::Completed(report) => {
                    for entry in &report.notes {
                        println!("{}: {}", entry.path, entry.outcome);
                    }
                    println!("{}", report.summary());
                    tracing::info!(
                        command = "publish-all",
                        published = report.published,
                        errors = report.errors,
                        "Bulk publish complete"
                    );
                    Ok(())
                }
                BulkOutcome::Rejected(reason) => {
                    println!("Nothing published: {reason}");
                    Ok(())
                }
                BulkOutcome::Failed(e) => {
                    tracing::error!(command = "publish-all", error = %e, "Bulk publish failed");
                    Err(anyhow::Error::new(e).context("Failed to scan the vault"))
                }
            }
        }
        Commands::Check { config } => {
            let loaded = load(&config, cli.debug)?;
            let client = wiki_client(&loaded);
            let pages = check_connection(&loaded.settings, &client)
                .await
                .with_context(|| format!("Cannot reach {}", loaded.settings.base_url))?;
            println!("Connected to {} ({pages} pages)", loaded.settings.base_url);
            Ok(())
        }
        Commands::EncryptToken { config, token } => {
            let mut loaded = load(&config, cli.debug)?;
            let blob = Base64TokenStore.encrypt(&token)?;
            loaded.stored_token = Some(blob);
            save_config(&config, &loaded)?;
            println!("Token stored in {}", config.display());
            Ok(())
        }
    }
}
