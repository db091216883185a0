//! Canonical street names learned during pass one.

use std::collections::HashMap;

use log::warn;
use serde::Serialize;

use crate::street::PrefixClass;

/// A key registered twice in one table with different canonical forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableConflict {
    pub class: PrefixClass,
    pub key: String,
    pub previous: String,
    pub replacement: String,
}

/// One table per prefix class, keyed by the lowercased name without prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTables {
    boulevard: HashMap<String, String>,
    street: HashMap<String, String>,
    square: HashMap<String, String>,
}

impl PrefixTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, class: PrefixClass) -> &HashMap<String, String> {
        match class {
            PrefixClass::Boulevard => &self.boulevard,
            PrefixClass::Street => &self.street,
            PrefixClass::Square => &self.square,
        }
    }

    fn table_mut(&mut self, class: PrefixClass) -> &mut HashMap<String, String> {
        match class {
            PrefixClass::Boulevard => &mut self.boulevard,
            PrefixClass::Street => &mut self.street,
            PrefixClass::Square => &mut self.square,
        }
    }

    /// Registers a normalized street name under its prefix class.
    ///
    /// Names without a canonical prefix are ignored. A later registration of
    /// the same key replaces the earlier one and is reported as a conflict
    /// when the canonical forms differ.
    pub fn register(&mut self, canonical: &str) -> Option<TableConflict> {
        let (class, rest) = PrefixClass::split_canonical(canonical)?;
        let key = rest.to_lowercase();
        let previous = self
            .table_mut(class)
            .insert(key.clone(), canonical.to_owned())?;
        if previous == canonical {
            return None;
        }

        warn!("{class:?} table: {key:?} registered as {previous:?} and {canonical:?}");
        Some(TableConflict {
            class,
            key,
            previous,
            replacement: canonical.to_owned(),
        })
    }

    /// First table, in [`PrefixClass::LOOKUP_ORDER`], holding `key`.
    pub fn lookup(&self, key: &str) -> Option<(PrefixClass, &str)> {
        PrefixClass::LOOKUP_ORDER.into_iter().find_map(|class| {
            self.table(class)
                .get(key)
                .map(|canonical| (class, canonical.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.boulevard.len() + self.street.len() + self.square.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
