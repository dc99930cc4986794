//! Line-oriented front matter scanner.
//!
//! A front matter block is an opening `---` line at the very start of the note, any number
//! of `key: value` lines, and a closing `---` line. Values are single-line scalars; nested
//! structures and multi-line values are not supported and their lines are skipped.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Literal values (after coercion) that mark a note for publishing.
const PUBLISH_LITERALS: [&str; 5] = ["true", "\"true\"", "'true'", "True", "TRUE"];

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
            .expect("front matter regex is valid")
    })
}

/// A coerced front matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl FrontMatterValue {
    /// Coerces a raw value: quoted strings are unquoted, `true`/`false` (any case) become
    /// booleans, fully numeric literals become numbers, anything else stays a string.
    pub fn coerce(raw: &str) -> Self {
        let v = raw.trim();
        if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
            let unescaped = serde_json::from_str::<String>(v)
                .unwrap_or_else(|_| v[1..v.len() - 1].to_string());
            return FrontMatterValue::String(unescaped);
        }
        if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
            return FrontMatterValue::String(v[1..v.len() - 1].replace("''", "'"));
        }
        if v.eq_ignore_ascii_case("true") {
            return FrontMatterValue::Bool(true);
        }
        if v.eq_ignore_ascii_case("false") {
            return FrontMatterValue::Bool(false);
        }
        if let Ok(n) = v.parse::<f64>() {
            if n.is_finite() {
                return FrontMatterValue::Number(n);
            }
        }
        FrontMatterValue::String(v.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontMatterValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Display text of any value; integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FrontMatterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontMatterValue::String(s) => f.write_str(s),
            FrontMatterValue::Bool(b) => write!(f, "{b}"),
            FrontMatterValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FrontMatterValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered key/value record parsed from a note's front matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    entries: Vec<(String, FrontMatterValue)>,
}

impl FrontMatter {
    /// Inserts or replaces `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: FrontMatterValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontMatterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parses the front matter block at the head of `raw`. Returns an empty record when
/// there is none; malformed lines are skipped.
pub fn extract(raw: &str) -> FrontMatter {
    let mut record = FrontMatter::default();
    let Some(caps) = block_regex().captures(raw) else {
        return record;
    };
    let Some(body) = caps.get(1) else {
        return record;
    };
    for line in body.as_str().lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            tracing::trace!(line, "Skipping front matter line without a key");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        record.insert(key, FrontMatterValue::coerce(value));
    }
    record
}

/// Removes the front matter block (delimiters included) and left-trims what remains.
/// Text without a block is returned unchanged.
pub fn strip_block(raw: &str) -> String {
    match block_regex().find(raw) {
        Some(m) => raw[m.end()..].trim_start().to_string(),
        None => raw.to_string(),
    }
}

/// True only for boolean `true` or one of a fixed set of literal strings. `yes`, `1` and
/// friends do not count.
pub fn is_publish_requested(record: &FrontMatter, publish_key: &str) -> bool {
    match record.get(publish_key) {
        Some(FrontMatterValue::Bool(b)) => *b,
        Some(FrontMatterValue::String(s)) => PUBLISH_LITERALS.contains(&s.as_str()),
        _ => false,
    }
}
