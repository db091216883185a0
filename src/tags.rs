//! Classification of `<tag>` keys by naming convention.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::element::RawElement;

static LOWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*$").unwrap());
static LOWER_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").unwrap());
static PROBLEM_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKeyClass {
    /// Lowercase letters and underscores only.
    Plain,
    /// Two plain parts joined by a single colon.
    Namespaced,
    /// Contains a character that is awkward as a document key.
    Problem,
    Unmatched,
}

pub fn classify_key(key: &str) -> TagKeyClass {
    if LOWER.is_match(key) {
        TagKeyClass::Plain
    } else if LOWER_COLON.is_match(key) {
        TagKeyClass::Namespaced
    } else if PROBLEM_CHARS.is_match(key) {
        TagKeyClass::Problem
    } else {
        TagKeyClass::Unmatched
    }
}

/// Counts the key class of every `tag` child of `element`.
pub fn scan_tags(element: &RawElement, diagnostics: &mut Diagnostics) {
    for key in element
        .children_named("tag")
        .filter_map(|tag| tag.attr("k"))
    {
        match classify_key(key) {
            TagKeyClass::Plain => diagnostics.plain_key(),
            TagKeyClass::Namespaced => diagnostics.colon_key(key),
            TagKeyClass::Problem => diagnostics.problem_key(key),
            TagKeyClass::Unmatched => diagnostics.unmatched_key(key),
        }
    }
}
