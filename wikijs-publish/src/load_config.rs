/// `load_config` module: reads the YAML settings file into [`PublishSettings`] and writes it
/// back when settings change.
///
/// This module is the only place where the untrusted YAML is parsed and mapped to the
/// strongly-typed settings the core pipeline consumes.
///
/// # Responsibilities
/// - Parse the `wiki`, `publish` and `vault` sections with serde defaults for optional keys
/// - Normalise the base URL (no trailing slash)
/// - Inject `WIKIJS_API_TOKEN` from the environment as the token, stored through the
///   [`TokenStore`] like a configured one
/// - Persist settings with [`save_config`] without leaking an environment token to disk
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics and surface at the CLI boundary.
///
/// Accepted YAML:
/// ```yaml
/// wiki:
///   base_url: https://wiki.example.com
///   api_token: <blob written by `encrypt-token`>
///   ca_cert_path: ./certs/internal-ca.pem
/// publish:
///   default_tags: [notes]
///   publish_key: wikijs_publish
///   path_prefix_key: wikijs_path
///   sync_tags: true
///   request_delay_ms: 500
/// vault:
///   root: ./notes
/// debug: false
/// ```
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use wikijs_publish_core::config::{
    normalise_base_url, DEFAULT_PATH_PREFIX_KEY, DEFAULT_PUBLISH_KEY, DEFAULT_REQUEST_DELAY,
};
use wikijs_publish_core::contract::TokenStore;
use wikijs_publish_core::PublishSettings;

use crate::token::Base64TokenStore;

pub const TOKEN_ENV_VAR: &str = "WIKIJS_API_TOKEN";

/// Settings plus the CLI-only parts of the config file.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: PublishSettings,
    pub vault_root: PathBuf,
    /// Token blob as found in the file, independent of any environment override.
    pub stored_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawConfig {
    wiki: WikiSection,
    #[serde(default)]
    publish: PublishSection,
    #[serde(default)]
    vault: VaultSection,
    #[serde(default)]
    debug: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WikiSection {
    base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PublishSection {
    #[serde(default)]
    default_tags: Vec<String>,
    #[serde(default = "default_publish_key")]
    publish_key: String,
    #[serde(default = "default_path_prefix_key")]
    path_prefix_key: String,
    #[serde(default)]
    sync_tags: bool,
    #[serde(default = "default_request_delay_ms")]
    request_delay_ms: u64,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            default_tags: Vec::new(),
            publish_key: default_publish_key(),
            path_prefix_key: default_path_prefix_key(),
            sync_tags: false,
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct VaultSection {
    #[serde(default = "default_vault_root")]
    root: PathBuf,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            root: default_vault_root(),
        }
    }
}

fn default_publish_key() -> String {
    DEFAULT_PUBLISH_KEY.to_string()
}

fn default_path_prefix_key() -> String {
    DEFAULT_PATH_PREFIX_KEY.to_string()
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY.as_millis() as u64
}

fn default_vault_root() -> PathBuf {
    PathBuf::from(".")
}

/// Loads the YAML config file and applies the environment token override.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let stored_token = raw.wiki.api_token.clone().filter(|t| !t.trim().is_empty());
    let api_token = match std::env::var(TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_ENV_VAR} found in env, overriding stored token");
            Some(
                Base64TokenStore
                    .encrypt(&token)
                    .context("Failed to store token from environment")?,
            )
        }
        _ => stored_token.clone(),
    };

    let settings = PublishSettings {
        base_url: normalise_base_url(&raw.wiki.base_url),
        api_token,
        default_tags: raw.publish.default_tags,
        publish_key: raw.publish.publish_key,
        path_prefix_key: raw.publish.path_prefix_key,
        ca_cert_path: raw.wiki.ca_cert_path,
        sync_tags: raw.publish.sync_tags,
        debug: raw.debug,
        request_delay: Duration::from_millis(raw.publish.request_delay_ms),
    };
    settings.trace_loaded();

    Ok(CliConfig {
        settings,
        vault_root: raw.vault.root,
        stored_token,
    })
}

/// Writes `config` back to `path`. The token written is `stored_token`, never an
/// environment override.
pub fn save_config<P: AsRef<Path>>(path: P, config: &CliConfig) -> Result<()> {
    let path_ref = path.as_ref();
    let settings = &config.settings;
    let raw = RawConfig {
        wiki: WikiSection {
            base_url: settings.base_url.clone(),
            api_token: config.stored_token.clone(),
            ca_cert_path: settings.ca_cert_path.clone(),
        },
        publish: PublishSection {
            default_tags: settings.default_tags.clone(),
            publish_key: settings.publish_key.clone(),
            path_prefix_key: settings.path_prefix_key.clone(),
            sync_tags: settings.sync_tags,
            request_delay_ms: settings.request_delay.as_millis() as u64,
        },
        vault: VaultSection {
            root: config.vault_root.clone(),
        },
        debug: settings.debug,
    };
    let yaml = serde_yaml::to_string(&raw).context("Failed to serialise config")?;
    fs::write(path_ref, yaml)
        .with_context(|| format!("Failed to write config file {:?}", path_ref))?;
    info!(config_path = ?path_ref, "Config saved");
    Ok(())
}
