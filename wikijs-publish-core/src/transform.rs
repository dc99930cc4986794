//! Note-to-wiki content transformation: front matter removal, wiki-link rewriting, slugs.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::directory::SlugIndex;
use crate::frontmatter;

fn aliased_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\[([^\]|]+)\|([^\]]+)\]\]").expect("aliased link regex is valid")
    })
}

fn plain_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(!?)\[\[([^\]|]+)\]\]").expect("plain link regex is valid"))
}

pub fn remove_front_matter(raw: &str) -> String {
    frontmatter::strip_block(raw)
}

/// Lowercases, folds diacritics away and joins every run of characters outside
/// `[a-z0-9]` into a single `-`, with no leading or trailing `-`.
pub fn slugify(text: &str) -> String {
    let folded = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Resolves a link target to a wiki path: the full path of the page whose last path
/// segment equals the target's slug, or the bare slug when no page matches.
fn resolve_target(target: &str, index: &SlugIndex) -> String {
    let slug = slugify(target);
    match index.get(&slug) {
        Some(page) => page.path.clone(),
        None => slug,
    }
}

/// Rewrites `[[Target|Alias]]` and `[[Target]]` into markdown links to wiki paths.
/// Embeds (`![[Target]]`) and all other text pass through untouched.
pub fn convert_links(content: &str, index: &SlugIndex) -> String {
    let aliased = aliased_link_regex().replace_all(content, |caps: &Captures| {
        let alias = &caps[2];
        format!("[{alias}](/{})", resolve_target(caps[1].trim(), index))
    });

    plain_link_regex()
        .replace_all(&aliased, |caps: &Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            let target = &caps[2];
            format!("[{target}](/{})", resolve_target(target.trim(), index))
        })
        .into_owned()
}
