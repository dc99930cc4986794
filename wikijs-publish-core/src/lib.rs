#![doc = "wikijs-publish-core: the publish pipeline behind wikijs-publish."]

//! This crate contains the pipeline logic: front matter parsing, link rewriting, tag
//! resolution and the create-or-update orchestration against a Wiki.js server.
//! Network, filesystem and credential access sit behind the traits in [`contract`].
//!
//! # Usage
//! Build a [`publish::PublishContext`] from [`config::PublishSettings`] and implementations
//! of [`contract::WikiApi`] and [`contract::Vault`], then call [`publish::publish_note`] or
//! [`publish::publish_all`].

pub mod config;
pub mod contract;
pub mod directory;
pub mod error;
pub mod frontmatter;
pub mod publish;
pub mod tags;
pub mod transform;

pub use config::PublishSettings;
pub use error::PublishError;
