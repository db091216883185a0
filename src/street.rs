//! Street-name cleanup.
//!
//! Names are normalized towards the `бул. `/`ул. `/`пл. ` prefixed forms used
//! by Sofia street signs. Canonical spellings come from [`CorrectionTables`].

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::CorrectionTables;

/// Street designation recognised in names and lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixClass {
    Boulevard,
    Street,
    Square,
}

impl PrefixClass {
    /// Pass-two lookup priority.
    pub const LOOKUP_ORDER: [PrefixClass; 3] = [Self::Boulevard, Self::Street, Self::Square];

    /// Order in which spelled-out designations are abbreviated.
    const EXPANSION_ORDER: [PrefixClass; 3] = [Self::Street, Self::Boulevard, Self::Square];

    pub fn root(self) -> &'static str {
        match self {
            Self::Boulevard => "бул",
            Self::Street => "ул",
            Self::Square => "пл",
        }
    }

    pub fn full_word(self) -> &'static str {
        match self {
            Self::Boulevard => "булевард",
            Self::Street => "улица",
            Self::Square => "площад",
        }
    }

    /// Root, period and trailing space, e.g. `"ул. "`.
    pub fn canonical_prefix(self) -> &'static str {
        match self {
            Self::Boulevard => "бул. ",
            Self::Street => "ул. ",
            Self::Square => "пл. ",
        }
    }

    /// Splits a canonical prefix off the front of `name`.
    pub fn split_canonical(name: &str) -> Option<(Self, &str)> {
        Self::LOOKUP_ORDER.into_iter().find_map(|class| {
            name.strip_prefix(class.canonical_prefix())
                .map(|rest| (class, rest))
        })
    }
}

const QUOTE_CHARS: [char; 5] = ['\'', '"', '”', '„', '“'];
const HOUSING_BLOCK_MARKER: &str = "жк.";

// A prefix root, its separator, then the first character of the name proper.
static STREET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(бул|ул|пл)(\s\.|\.\s|\.|\s)(\S)").unwrap());

/// Applies the correction tables and prefix rules to street names.
#[derive(Debug, Clone)]
pub struct StreetNormalizer {
    corrected_names: HashMap<String, String>,
    translations: HashMap<String, String>,
    skipped_streets: HashSet<String>,
}

impl Default for StreetNormalizer {
    fn default() -> Self {
        Self::new(CorrectionTables::default())
    }
}

impl From<CorrectionTables> for StreetNormalizer {
    fn from(tables: CorrectionTables) -> Self {
        Self::new(tables)
    }
}

impl StreetNormalizer {
    pub fn new(tables: CorrectionTables) -> Self {
        let corrected_names = tables
            .corrected_names
            .into_iter()
            .map(|name| (name.to_lowercase(), name))
            .collect();
        Self {
            corrected_names,
            translations: tables.translations.into_iter().collect(),
            skipped_streets: tables.skipped_streets.into_iter().collect(),
        }
    }

    /// Whether an `addr:street` value should be ignored entirely.
    pub fn skip_street(&self, value: &str) -> bool {
        value.starts_with("http")
            || value.starts_with(HOUSING_BLOCK_MARKER)
            || self.skipped_streets.contains(value)
    }

    pub fn correct_street_name(&self, name: &str) -> String {
        let cleaned: String = name
            .trim()
            .chars()
            .filter(|ch| !QUOTE_CHARS.contains(ch))
            .collect();
        let cleaned = abbreviate_designation(cleaned);

        if let Some(canonical) = self.corrected_names.get(&cleaned.to_lowercase()) {
            return canonical.clone();
        }
        if let Some(translated) = self.translations.get(&cleaned) {
            return translated.clone();
        }
        normalize_prefixes(&cleaned)
    }
}

/// Replaces a leading spelled-out designation with its abbreviation.
fn abbreviate_designation(name: String) -> String {
    for class in PrefixClass::EXPANSION_ORDER {
        if let Some(rest) = name.strip_prefix(class.full_word()) {
            return format!("{}.{rest}", class.root());
        }
    }
    name
}

/// Rewrites every prefix root with a sloppy separator to `root + ". "`.
///
/// The character after the separator must be non-space and is left in place
/// for the next match.
fn normalize_prefixes(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len() + 4);
    let mut pos = 0;
    while let Some(caps) = STREET_PREFIX.captures_at(name, pos) {
        let (Some(whole), Some(root), Some(next)) = (caps.get(0), caps.get(1), caps.get(3)) else {
            break;
        };
        normalized.push_str(&name[pos..whole.start()]);
        normalized.push_str(&root.as_str().to_lowercase());
        normalized.push_str(". ");
        pos = next.start();
    }
    normalized.push_str(&name[pos..]);
    normalized
}
