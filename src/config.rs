//! Manual correction tables consumed by the street normalizer.
//!
//! The built-in tables cover the Sofia export this tool was written for. A
//! TOML file can replace any of them:
//!
//! ```toml
//! corrected_names = ["бул. Витоша"]
//! skipped_streets = ["no"]
//!
//! [translations]
//! "Gotse Delchev" = "Гоце Делчев"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

const CORRECTED_NAMES: [&str; 14] = [
    "ул. Ген. Йосиф В. Гурко",
    "бул. Ген. Тотлебен",
    "бул. Цариградско шосе",
    "бул. Черни връх",
    "ул. Магнаурска школа",
    "ул. Стара планина",
    "бул. Витоша",
    "Цар Борис III",
    "Родопски извор",
    "Гоце Делчев",
    "Три уши",
    "Връх Манчо",
    "Черни връх",
    "Детелин войвода",
];

const TRANSLATED_STREETS: [(&str, &str); 21] = [
    ("Andrey Saharov Blvd", "Андрей Сахаров"),
    ("Atanas Kirchev", "Атанас Кирчев"),
    ("Boulevard Iskarsko Shose", "Искърско шосе"),
    ("Bul. Vitosha", "бул. Витоша"),
    ("Gen. Asen Nikolov", "Ген. Асен Николов"),
    ("Georgi S. Rakovski", "Георги С. Раковски"),
    ("Golyama mogila street", "Голяма Могила"),
    ("Gotse Delchev", "Гоце Делчев"),
    ("Kumata 1", "Кумата"),
    ("Madara", "Мадара"),
    ("Metodi Popov Str.", "Методи Попов"),
    ("Nikola Gabrovski", "Никола Габровски"),
    ("Panayot Volov", "Панайот Волов"),
    ("Pyrwa", "Първа Българска армия"),
    ("Slavyanska", "Славянска"),
    ("Srebarna", "Сребърна"),
    ("Tsarigradsko Chausse Blvd", "Цариградско шосе"),
    ("Vitosha", "Витоша"),
    ("vitosha", "Витоша"),
    ("bul.Tzar Boris III", "Цар Борис III"),
    // Cyrillic "І" (U+0406) standing in for the Latin numeral.
    ("Цар Борис \u{0406}\u{0406}\u{0406}", "Цар Борис III"),
];

const SKIPPED_STREETS: [&str; 4] = ["no", "apartments", "c", "Tietotie"];

/// Static correction data; never modified during a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrectionTables {
    /// Canonical capitalizations, matched case-insensitively.
    pub corrected_names: Vec<String>,
    /// Exact-match Latin variants and their Cyrillic forms.
    pub translations: BTreeMap<String, String>,
    /// Street values that are dropped outright.
    pub skipped_streets: Vec<String>,
}

impl Default for CorrectionTables {
    fn default() -> Self {
        Self {
            corrected_names: CORRECTED_NAMES.iter().map(|name| (*name).to_owned()).collect(),
            translations: TRANSLATED_STREETS
                .iter()
                .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
                .collect(),
            skipped_streets: SKIPPED_STREETS.iter().map(|name| (*name).to_owned()).collect(),
        }
    }
}

impl CorrectionTables {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}
