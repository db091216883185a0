//! Extraction and cleanup of addresses from OpenStreetMap XML exports.
//!
//! A run has two passes. Pass one streams the document, turns every `node`
//! and `way` into a [`Record`] and learns the canonical prefixed spelling of
//! each street it normalizes. Pass two revisits the records and gives every
//! street without a `бул. `/`ул. `/`пл. ` prefix the form learned in pass one,
//! or the generic street prefix.
//!
//! Invariants:
//! - All mutable state belongs to one [`ParseRun`]; there are no globals.
//! - Elements are owned by the caller for a single iteration step.

pub mod address;
pub mod config;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod extract;
pub mod fields;
pub mod lookup;
pub mod parser;
pub mod reconcile;
pub mod record;
pub mod sink;
pub mod street;
pub mod tags;

pub use config::CorrectionTables;
pub use diagnostics::Diagnostics;
pub use element::RawElement;
pub use error::{ConfigError, ParseError, SinkError, SkipReason};
pub use extract::{count_elements, count_elements_in_file, ElementStream};
pub use lookup::{PrefixTables, TableConflict};
pub use parser::{parse_file, parse_reader, ElementOutcome, ParseOutput, ParseRun};
pub use reconcile::{reconcile, ReconcileSummary, Resolution};
pub use record::{Address, ElementData, ElementKind, Location, Record, Timestamp, User};
pub use sink::{write_records, CsvSink, JsonLinesSink, RecordSink};
pub use street::{PrefixClass, StreetNormalizer};
