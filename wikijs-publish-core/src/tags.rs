//! Tag set resolution for published pages.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::frontmatter::{self, FrontMatterValue};

const TAGS_KEY: &str = "tags";

fn inline_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^|\s)#([\p{L}\p{N}_/\-]*[\p{L}_/\-][\p{L}\p{N}_/\-]*)")
            .expect("inline tag regex is valid")
    })
}

/// Union of `defaults` and `note_tags`: leading `#` stripped, trimmed, empties dropped,
/// duplicates collapsed. The first occurrence fixes the position of each tag.
pub fn publish_tags<I, S>(defaults: &[String], note_tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    let mut push = |raw: &str| {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
        if !tag.is_empty() && seen.insert(tag.to_string()) {
            tags.push(tag.to_string());
        }
    };
    for raw in defaults {
        push(raw);
    }
    for raw in note_tags {
        push(raw.as_ref());
    }
    tags
}

/// Tags a note declares itself: the front matter `tags` value (comma separated, optionally
/// bracketed) followed by inline `#tags` in the body. This mirrors what a host's metadata
/// index reports for a note.
pub fn note_tags_from_text(raw: &str) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(FrontMatterValue::String(list)) = frontmatter::extract(raw).get(TAGS_KEY) {
        let list = list.trim().trim_start_matches('[').trim_end_matches(']');
        tags.extend(
            list.split(',')
                .map(|t| t.trim().trim_matches(|c| c == '"' || c == '\''))
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
    }

    let body = frontmatter::strip_block(raw);
    tags.extend(
        inline_tag_regex()
            .captures_iter(&body)
            .map(|caps| format!("#{}", &caps[1])),
    );
    tags
}
