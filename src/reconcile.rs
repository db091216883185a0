//! Pass two: give every street a designation prefix.
//!
//! Needs the complete record list and the complete lookup tables, so it only
//! runs after extraction has finished.

use log::info;
use serde::Serialize;

use crate::lookup::PrefixTables;
use crate::record::Record;
use crate::street::PrefixClass;

/// How a single street value was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Already carried a canonical prefix.
    Unchanged,
    /// Found in the table of the given class.
    FromTable(PrefixClass, String),
    /// Not found anywhere; the generic street prefix was prepended.
    Defaulted(String),
}

pub fn resolve_street(street: &str, tables: &PrefixTables) -> Resolution {
    if PrefixClass::split_canonical(street).is_some() {
        return Resolution::Unchanged;
    }
    match tables.lookup(&street.to_lowercase()) {
        Some((class, canonical)) => Resolution::FromTable(class, canonical.to_owned()),
        None => Resolution::Defaulted(format!(
            "{}{street}",
            PrefixClass::Street.canonical_prefix()
        )),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub unchanged: u64,
    pub boulevard: u64,
    pub street: u64,
    pub square: u64,
    pub defaulted: u64,
}

impl ReconcileSummary {
    fn count(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Unchanged => self.unchanged += 1,
            Resolution::FromTable(PrefixClass::Boulevard, _) => self.boulevard += 1,
            Resolution::FromTable(PrefixClass::Street, _) => self.street += 1,
            Resolution::FromTable(PrefixClass::Square, _) => self.square += 1,
            Resolution::Defaulted(_) => self.defaulted += 1,
        }
    }
}

/// Rewrites the street of every record that lacks a canonical prefix.
pub fn reconcile(records: &mut [Record], tables: &PrefixTables) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    for street in records
        .iter_mut()
        .filter_map(|record| record.address.as_mut()?.street.as_mut())
    {
        let resolution = resolve_street(street, tables);
        summary.count(&resolution);
        match resolution {
            Resolution::Unchanged => {}
            Resolution::FromTable(_, canonical) | Resolution::Defaulted(canonical) => {
                *street = canonical;
            }
        }
    }
    info!(
        "Reconciled streets: {} unchanged, {} from tables, {} defaulted",
        summary.unchanged,
        summary.boulevard + summary.street + summary.square,
        summary.defaulted
    );
    summary
}
