//! The parse run: pass one over the element stream, then pass two.

use std::io::BufRead;
use std::path::Path;

use log::{debug, info};

use crate::address::{address_part, apply_address_tag};
use crate::diagnostics::Diagnostics;
use crate::element::RawElement;
use crate::error::{ParseError, SkipReason};
use crate::extract::ElementStream;
use crate::fields::{parse_common_field, parse_location, parse_node_refs, parse_timestamp, parse_user};
use crate::lookup::PrefixTables;
use crate::reconcile::{reconcile, ReconcileSummary};
use crate::record::{Address, ElementData, ElementKind, Record};
use crate::street::StreetNormalizer;
use crate::tags::scan_tags;

/// Result of pass one for a single element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementOutcome {
    Record(Record),
    Skipped(SkipReason),
    /// Not a node or way.
    Ignored,
}

/// Everything a finished run hands back.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub records: Vec<Record>,
    pub diagnostics: Diagnostics,
    pub tables: PrefixTables,
    pub reconcile: ReconcileSummary,
}

/// State owned by a single run: lookup tables, counters and the record list.
pub struct ParseRun<'a> {
    normalizer: &'a StreetNormalizer,
    tables: PrefixTables,
    diagnostics: Diagnostics,
    records: Vec<Record>,
}

fn required_attr<'e>(element: &'e RawElement, attribute: &'static str) -> Result<&'e str, ParseError> {
    element
        .attr(attribute)
        .ok_or_else(|| ParseError::MissingAttribute {
            element: element.name().to_owned(),
            attribute,
        })
}

impl<'a> ParseRun<'a> {
    pub fn new(normalizer: &'a StreetNormalizer) -> Self {
        Self {
            normalizer,
            tables: PrefixTables::new(),
            diagnostics: Diagnostics::default(),
            records: Vec::new(),
        }
    }

    pub fn tables(&self) -> &PrefixTables {
        &self.tables
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Pass one for one element.
    ///
    /// Streets are registered in the lookup tables as they are met, so a
    /// street seen before a rejected postcode still teaches its canonical
    /// form even though the element itself is skipped.
    pub fn parse_element(&mut self, element: &RawElement) -> Result<ElementOutcome, ParseError> {
        let Some(kind) = ElementKind::from_tag(element.name()) else {
            return Ok(ElementOutcome::Ignored);
        };
        let diagnostics = &mut self.diagnostics;
        diagnostics.record_element_fields(element.attributes().map(|(key, _)| key));

        let id = required_attr(element, "id")?.to_owned();
        let user = parse_user(element, diagnostics);
        let timestamp = parse_timestamp(element, diagnostics);
        let changeset = parse_common_field(element, "changeset", diagnostics);
        let version = parse_common_field(element, "version", diagnostics);
        let data = match kind {
            ElementKind::Node => ElementData::Node {
                location: parse_location(element, kind, diagnostics)?,
            },
            ElementKind::Way => ElementData::Way {
                node_refs: parse_node_refs(element)?,
            },
        };
        scan_tags(element, diagnostics);

        let mut record = Record {
            id,
            data,
            user,
            timestamp,
            changeset,
            version,
            amenity: None,
            name: None,
            address: None,
        };
        let mut address: Option<Address> = None;

        for tag in element.children_named("tag") {
            let key = required_attr(tag, "k")?;
            let value = required_attr(tag, "v")?;
            if key == "amenity" {
                record.amenity = Some(value.trim().to_owned());
            } else if let Some(part) = address_part(key) {
                let applied = apply_address_tag(
                    &mut address,
                    part,
                    value,
                    self.normalizer,
                    &mut self.tables,
                    &mut self.diagnostics,
                );
                if let Err(reason) = applied {
                    debug!("skipping {} {}: {reason}", kind.as_str(), record.id);
                    self.diagnostics.skipped_item();
                    return Ok(ElementOutcome::Skipped(reason));
                }
            } else if key == "name" {
                record.name = Some(value.trim().to_owned());
            }
        }

        record.address = address;
        Ok(ElementOutcome::Record(record))
    }

    /// Runs pass one over `elements`. Each element is dropped once parsed.
    pub fn extract<I>(&mut self, elements: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = Result<RawElement, ParseError>>,
    {
        for element in elements {
            if let ElementOutcome::Record(record) = self.parse_element(&element?)? {
                self.records.push(record);
            }
        }
        Ok(())
    }

    /// Pass two, consuming the run.
    pub fn finish(mut self) -> ParseOutput {
        let reconcile = reconcile(&mut self.records, &self.tables);
        info!(
            "Parsed {} records ({} skipped), {} canonical street names learned",
            self.records.len(),
            self.diagnostics.skipped_items,
            self.tables.len()
        );
        ParseOutput {
            records: self.records,
            diagnostics: self.diagnostics,
            tables: self.tables,
            reconcile,
        }
    }

    /// Both passes over a stream of elements.
    pub fn run<I>(mut self, elements: I) -> Result<ParseOutput, ParseError>
    where
        I: IntoIterator<Item = Result<RawElement, ParseError>>,
    {
        self.extract(elements)?;
        Ok(self.finish())
    }
}

/// Parses an OSM XML document from any buffered source.
pub fn parse_reader<R: BufRead>(
    source: R,
    normalizer: &StreetNormalizer,
) -> Result<ParseOutput, ParseError> {
    ParseRun::new(normalizer).run(ElementStream::new(source))
}

/// Parses an OSM XML file.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use extract_street_addresses::{parse_file, StreetNormalizer};
///
/// # fn main() -> Result<(), extract_street_addresses::ParseError> {
/// let output = parse_file(Path::new("sofia.osm"), &StreetNormalizer::default())?;
/// println!("{} records", output.records.len());
/// # Ok(())
/// # }
/// ```
pub fn parse_file(path: &Path, normalizer: &StreetNormalizer) -> Result<ParseOutput, ParseError> {
    ParseRun::new(normalizer).run(ElementStream::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Location, Timestamp};
    use crate::street::PrefixClass;
    use tempfile::tempdir;

    const OSM_SAMPLE: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<osm version="0.6" generator="test">
  <node id="1" lat="42.0" lon="23.0" version="1" timestamp="2020-01-01T00:00:00Z">
    <tag k="addr:street" v="улица Раковски" />
  </node>
  <node id="2" lat="42.1" lon="23.1" user="sofia" uid="42" changeset="77" version="2" timestamp="2020-01-02T00:00:00Z">
    <tag k="amenity" v=" cafe " />
    <tag k="name" v="Кафе" />
    <tag k="addr:postcode" v="1164" />
    <tag k="addr:suburb" v="Лозенец" />
  </node>
  <way id="10" version="1" timestamp="2020-01-03T00:00:00Z">
    <nd ref="2" />
    <nd ref="1" />
    <tag k="highway" v="residential" />
    <tag k="addr:street" v="Бул.Витоша" />
  </way>
</osm>
"#;

    const OSM_BAD_POSTCODE: &str = r#"<osm>
  <node id="1" lat="42.0" lon="23.0">
    <tag k="addr:street" v="ул. Шипка" />
    <tag k="addr:postcode" v="2500" />
  </node>
  <node id="2" lat="42.0" lon="23.0">
    <tag k="addr:postcode" v="abc" />
  </node>
  <node id="3" lat="42.0" lon="23.0">
    <tag k="addr:postcode" v="FIXME" />
    <tag k="addr:street" v="Шипка" />
  </node>
</osm>
"#;

    const OSM_RECONCILE: &str = r#"<osm>
  <node id="1" lat="42.0" lon="23.0">
    <tag k="addr:street" v="Bul. Vitosha" />
  </node>
  <node id="2" lat="42.0" lon="23.0">
    <tag k="addr:street" v="Vitosha" />
  </node>
  <node id="3" lat="42.0" lon="23.0">
    <tag k="addr:street" v="витоша" />
  </node>
  <node id="4" lat="42.0" lon="23.0">
    <tag k="addr:street" v="Солунска" />
  </node>
</osm>
"#;

    fn parse(xml: &str) -> ParseOutput {
        parse_reader(xml.as_bytes(), &StreetNormalizer::default()).unwrap()
    }

    #[test]
    fn builds_records_for_nodes_and_ways() {
        let output = parse(OSM_SAMPLE);
        assert_eq!(output.records.len(), 3);

        let first = &output.records[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.kind(), ElementKind::Node);
        assert_eq!(first.location(), Some(Location::new(42.0, 23.0)));
        assert!(first.street().unwrap().starts_with("ул. "));
        assert!(matches!(first.timestamp, Some(Timestamp::Parsed(_))));

        let cafe = &output.records[1];
        assert_eq!(cafe.amenity.as_deref(), Some("cafe"));
        assert_eq!(cafe.name.as_deref(), Some("Кафе"));
        assert_eq!(cafe.user.name.as_deref(), Some("sofia"));
        assert_eq!(cafe.changeset.as_deref(), Some("77"));
        let address = cafe.address.as_ref().unwrap();
        assert_eq!(address.postcode, Some(1164));
        assert_eq!(address.suburb.as_deref(), Some("Лозенец"));
        assert_eq!(address.street, None);

        let way = &output.records[2];
        assert_eq!(way.kind(), ElementKind::Way);
        assert_eq!(way.node_refs(), ["2", "1"]);
        assert_eq!(way.location(), None);
        assert_eq!(way.street(), Some("бул. Витоша"));
    }

    #[test]
    fn records_without_address_tags_have_no_address() {
        let output = parse(r#"<osm><node id="5" lat="1" lon="2"><tag k="name" v="x"/></node></osm>"#);
        assert_eq!(output.records[0].address, None);
    }

    #[test]
    fn bad_postcodes_drop_the_whole_element() {
        let output = parse(OSM_BAD_POSTCODE);
        let ids: Vec<&str> = output.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
        assert_eq!(output.diagnostics.skipped_items, 2);
        assert_eq!(output.diagnostics.fixme_postcodes, 1);

        // The street of the dropped node was still learned.
        assert_eq!(output.records[0].street(), Some("ул. Шипка"));
        assert_eq!(output.reconcile.street, 1);
    }

    #[test]
    fn skip_outcome_carries_the_reason() {
        let normalizer = StreetNormalizer::default();
        let mut run = ParseRun::new(&normalizer);
        let element = RawElement::new("node")
            .with_attribute("id", "9")
            .with_child(
                RawElement::new("tag")
                    .with_attribute("k", "addr:postcode")
                    .with_attribute("v", "2500"),
            );
        assert_eq!(
            run.parse_element(&element).unwrap(),
            ElementOutcome::Skipped(SkipReason::PostcodeOutOfRange(2500))
        );
        assert_eq!(run.diagnostics().skipped_items, 1);
    }

    #[test]
    fn streets_are_learned_while_parsing() {
        let normalizer = StreetNormalizer::default();
        let mut run = ParseRun::new(&normalizer);
        assert!(run.tables().is_empty());

        let element = RawElement::new("node").with_attribute("id", "7").with_child(
            RawElement::new("tag")
                .with_attribute("k", "addr:street")
                .with_attribute("v", "пл. Славейков"),
        );
        assert!(matches!(
            run.parse_element(&element).unwrap(),
            ElementOutcome::Record(_)
        ));
        assert_eq!(
            run.tables().lookup("славейков"),
            Some((PrefixClass::Square, "пл. Славейков"))
        );
    }

    #[test]
    fn unstored_address_tags_leave_no_address() {
        let output = parse(
            r#"<osm><node id="5" lat="1" lon="2">
  <tag k="addr:housenumber" v="12"/>
  <tag k="addr:city" v="София"/>
</node></osm>"#,
        );
        let record = &output.records[0];
        assert_eq!(record.address, None);
        assert_eq!(output.diagnostics.address_types.get("housenumber"), Some(&1));
    }

    #[test]
    fn other_elements_are_ignored() {
        let normalizer = StreetNormalizer::default();
        let mut run = ParseRun::new(&normalizer);
        let relation = RawElement::new("relation").with_attribute("id", "1");
        assert_eq!(run.parse_element(&relation).unwrap(), ElementOutcome::Ignored);
    }

    #[test]
    fn second_pass_uses_learned_names() {
        let output = parse(OSM_RECONCILE);
        let streets: Vec<Option<&str>> = output.records.iter().map(Record::street).collect();
        assert_eq!(
            streets,
            vec![
                Some("бул. Витоша"),
                Some("бул. Витоша"),
                Some("бул. Витоша"),
                Some("ул. Солунска"),
            ]
        );
        assert_eq!(
            output.tables.table(PrefixClass::Boulevard).get("витоша").map(String::as_str),
            Some("бул. Витоша")
        );
        assert_eq!(output.reconcile.boulevard, 2);
        assert_eq!(output.reconcile.defaulted, 1);
    }

    #[test]
    fn missing_id_is_fatal() {
        let err = parse_reader(
            r#"<osm><node lat="1" lon="2"/></osm>"#.as_bytes(),
            &StreetNormalizer::default(),
        )
        .expect_err("expected missing id");
        assert!(matches!(
            err,
            ParseError::MissingAttribute { attribute: "id", .. }
        ));
    }

    #[test]
    fn invalid_coordinate_aborts_the_run() {
        let err = parse_reader(
            r#"<osm><node id="1" lat="1" lon="2"/><node id="2" lat="x" lon="2"/></osm>"#.as_bytes(),
            &StreetNormalizer::default(),
        )
        .expect_err("expected coordinate error");
        assert!(matches!(err, ParseError::InvalidCoordinate { .. }));
    }

    #[test]
    fn diagnostics_follow_the_document() {
        let output = parse(OSM_SAMPLE);
        let diagnostics = &output.diagnostics;
        assert_eq!(diagnostics.missing_user_data.username, 2);
        assert_eq!(diagnostics.missing_common_fields.get("changeset"), Some(&2));
        assert_eq!(diagnostics.address_types.get("street"), Some(&2));
        assert_eq!(diagnostics.colon_tag_keys.get("addr:street"), Some(&2));
        assert_eq!(diagnostics.plain_tag_keys, 3);
        assert_eq!(
            &diagnostics.element_fields[..5],
            ["id", "lat", "lon", "version", "timestamp"]
        );
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempdir().unwrap();
        let osm_path = dir.path().join("sample.osm");
        std::fs::write(&osm_path, OSM_SAMPLE).unwrap();

        let output = parse_file(&osm_path, &StreetNormalizer::default()).unwrap();
        assert_eq!(output.records.len(), 3);

        let missing = dir.path().join("missing.osm");
        match parse_file(&missing, &StreetNormalizer::default()) {
            Err(ParseError::Open { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
