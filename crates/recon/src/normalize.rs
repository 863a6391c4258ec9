//! Title normalization for the drift guard.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

fn escaped_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&lt;.*?&gt;").expect("valid regex"))
}

fn literal_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("valid regex"))
}

/// Reduce a raw title to its set of lower-cased word tokens.
///
/// Escaped markup (`&lt;i&gt;`) is removed before literal markup, then any
/// leftover entity is treated as a separator.
pub fn title_tokens(raw: &str) -> BTreeSet<String> {
    let s = escaped_tag().replace_all(raw, " ");
    let s = literal_tag().replace_all(&s, " ");
    let s = entity().replace_all(&s, " ");

    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
