//! Side-effect counters gathered during a parse run.
//!
//! None of these influence record content; they exist so data problems in
//! an export can be spotted and fed back into the correction tables.

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::lookup::TableConflict;
use crate::record::ElementKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingUserData {
    pub username: u64,
    pub uid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MissingLocationData {
    pub lat: u64,
    pub lon: u64,
    pub node: u64,
    pub way: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub missing_user_data: MissingUserData,
    pub missing_location_data: MissingLocationData,
    pub missing_common_fields: BTreeMap<String, u64>,
    /// Attribute names seen on collected elements, in first-seen order.
    pub element_fields: Vec<String>,
    pub plain_tag_keys: u64,
    pub colon_tag_keys: BTreeMap<String, u64>,
    pub problem_tag_keys: BTreeMap<String, u64>,
    pub unmatched_tag_keys: BTreeMap<String, u64>,
    pub address_types: BTreeMap<String, u64>,
    pub wrong_postcodes: BTreeMap<String, u64>,
    pub fixme_postcodes: u64,
    pub skipped_items: u64,
    pub street_names: BTreeMap<String, u64>,
    pub lowered_street_names: BTreeMap<String, u64>,
    pub table_conflicts: Vec<TableConflict>,
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    *map.entry(key.to_owned()).or_insert(0) += 1;
}

impl Diagnostics {
    pub(crate) fn record_element_fields<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        for name in names {
            if !self.element_fields.iter().any(|seen| seen == name) {
                self.element_fields.push(name.to_owned());
            }
        }
    }

    pub(crate) fn missing_username(&mut self) {
        self.missing_user_data.username += 1;
    }

    pub(crate) fn missing_uid(&mut self) {
        self.missing_user_data.uid += 1;
    }

    pub(crate) fn missing_lat(&mut self, kind: ElementKind) {
        self.missing_location_data.lat += 1;
        match kind {
            ElementKind::Node => self.missing_location_data.node += 1,
            ElementKind::Way => self.missing_location_data.way += 1,
        }
    }

    pub(crate) fn missing_lon(&mut self) {
        self.missing_location_data.lon += 1;
    }

    pub(crate) fn missing_common_field(&mut self, field: &str) {
        bump(&mut self.missing_common_fields, field);
    }

    pub(crate) fn plain_key(&mut self) {
        self.plain_tag_keys += 1;
    }

    pub(crate) fn colon_key(&mut self, key: &str) {
        bump(&mut self.colon_tag_keys, key);
    }

    pub(crate) fn problem_key(&mut self, key: &str) {
        bump(&mut self.problem_tag_keys, key);
    }

    pub(crate) fn unmatched_key(&mut self, key: &str) {
        bump(&mut self.unmatched_tag_keys, key);
    }

    pub(crate) fn address_type(&mut self, part: &str) {
        bump(&mut self.address_types, part);
    }

    pub(crate) fn wrong_postcode(&mut self, code: &str) {
        bump(&mut self.wrong_postcodes, code);
    }

    pub(crate) fn fixme_postcode(&mut self) {
        self.fixme_postcodes += 1;
    }

    pub(crate) fn skipped_item(&mut self) {
        self.skipped_items += 1;
    }

    pub(crate) fn street_name(&mut self, name: &str) {
        bump(&mut self.street_names, name);
        bump(&mut self.lowered_street_names, &name.to_lowercase());
    }

    pub(crate) fn table_conflict(&mut self, conflict: TableConflict) {
        self.table_conflicts.push(conflict);
    }

    /// Street names that also occur with a different capitalization.
    pub fn inconsistent_street_names(&self) -> Vec<&str> {
        self.street_names
            .iter()
            .filter(|(name, count)| {
                self.lowered_street_names.get(&name.to_lowercase()) != Some(*count)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn log_summary(&self) {
        info!("Skipped items: {}", self.skipped_items);
        info!("FIXME postcodes: {}", self.fixme_postcodes);
        info!(
            "Missing user data: username={} uid={}",
            self.missing_user_data.username, self.missing_user_data.uid
        );
        info!(
            "Missing location data: lat={} lon={}",
            self.missing_location_data.lat, self.missing_location_data.lon
        );
        info!(
            "Tag keys: plain={} colon={} problem={} unmatched={}",
            self.plain_tag_keys,
            self.colon_tag_keys.values().sum::<u64>(),
            self.problem_tag_keys.values().sum::<u64>(),
            self.unmatched_tag_keys.values().sum::<u64>()
        );
        info!("Address types: {:?}", self.address_types);
        let inconsistent = self.inconsistent_street_names();
        if !inconsistent.is_empty() {
            info!("Street names with mixed capitalization: {inconsistent:?}");
        }
        if !self.table_conflicts.is_empty() {
            info!("Street table conflicts: {}", self.table_conflicts.len());
        }
    }
}
