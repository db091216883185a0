//! `addr:*` tag handling.

use crate::diagnostics::Diagnostics;
use crate::error::SkipReason;
use crate::lookup::PrefixTables;
use crate::record::Address;
use crate::street::StreetNormalizer;

const POSTCODE_RANGE: std::ops::Range<i64> = 1000..2000;
const FIXME_MARKERS: [&str; 2] = ["FIXME", "fixme"];

/// Second part of an `addr:<part>` key with exactly one colon.
pub fn address_part(key: &str) -> Option<&str> {
    let part = key.strip_prefix("addr:")?;
    (!part.contains(':')).then_some(part)
}

/// Parses a Sofia postcode.
///
/// Anything other than a code in range or a FIXME marker invalidates the
/// whole element.
pub fn parse_postcode(code: &str, diagnostics: &mut Diagnostics) -> Result<Option<u16>, SkipReason> {
    match code.trim().parse::<i64>() {
        Ok(numeric) if POSTCODE_RANGE.contains(&numeric) => {
            // The range check guarantees the value fits.
            Ok(u16::try_from(numeric).ok())
        }
        Ok(numeric) => {
            diagnostics.wrong_postcode(code);
            Err(SkipReason::PostcodeOutOfRange(numeric))
        }
        Err(_) if FIXME_MARKERS.contains(&code) => {
            diagnostics.fixme_postcode();
            Ok(None)
        }
        Err(_) => {
            diagnostics.wrong_postcode(code);
            Err(SkipReason::InvalidPostcode(code.to_owned()))
        }
    }
}

fn address_mut(address: &mut Option<Address>) -> &mut Address {
    address.get_or_insert_with(Address::default)
}

/// Applies one `addr:<part>` value to the address being built.
///
/// Streets are normalized and registered in `tables` as they are seen.
pub fn apply_address_tag(
    address: &mut Option<Address>,
    part: &str,
    value: &str,
    normalizer: &StreetNormalizer,
    tables: &mut PrefixTables,
    diagnostics: &mut Diagnostics,
) -> Result<(), SkipReason> {
    match part {
        "postcode" => {
            if let Some(postcode) = parse_postcode(value, diagnostics)? {
                address_mut(address).postcode = Some(postcode);
            }
        }
        "street" if !normalizer.skip_street(value) => {
            let street = normalizer.correct_street_name(value);
            diagnostics.street_name(&street);
            if let Some(conflict) = tables.register(&street) {
                diagnostics.table_conflict(conflict);
            }
            address_mut(address).street = Some(street);
        }
        "suburb" => address_mut(address).suburb = Some(value.trim().to_owned()),
        _ => {}
    }
    diagnostics.address_type(part);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("addr:street", Some("street"))]
    #[case("addr:", Some(""))]
    #[case("addr:street:en", None)]
    #[case("address", None)]
    #[case("name", None)]
    fn splits_address_keys(#[case] key: &str, #[case] expected: Option<&str>) {
        assert_eq!(address_part(key), expected);
    }

    #[rstest]
    #[case("1500", 1500)]
    #[case("1000", 1000)]
    #[case("1999", 1999)]
    #[case(" 1164 ", 1164)]
    fn accepts_postcodes_in_range(#[case] code: &str, #[case] expected: u16) {
        let mut diagnostics = Diagnostics::default();
        assert_eq!(parse_postcode(code, &mut diagnostics), Ok(Some(expected)));
    }

    #[rstest]
    #[case("999", SkipReason::PostcodeOutOfRange(999))]
    #[case("2000", SkipReason::PostcodeOutOfRange(2000))]
    #[case("2500", SkipReason::PostcodeOutOfRange(2500))]
    #[case("abc", SkipReason::InvalidPostcode("abc".to_owned()))]
    #[case("Fixme", SkipReason::InvalidPostcode("Fixme".to_owned()))]
    fn rejects_other_postcodes(#[case] code: &str, #[case] expected: SkipReason) {
        let mut diagnostics = Diagnostics::default();
        assert_eq!(parse_postcode(code, &mut diagnostics), Err(expected));
        assert_eq!(diagnostics.wrong_postcodes.get(code), Some(&1));
    }

    #[rstest]
    #[case("FIXME")]
    #[case("fixme")]
    fn fixme_is_counted_not_skipped(#[case] code: &str) {
        let mut diagnostics = Diagnostics::default();
        assert_eq!(parse_postcode(code, &mut diagnostics), Ok(None));
        assert_eq!(diagnostics.fixme_postcodes, 1);
    }

    #[test]
    fn fixme_postcode_does_not_create_an_address() {
        let mut address = None;
        let mut tables = PrefixTables::new();
        let mut diagnostics = Diagnostics::default();
        apply_address_tag(
            &mut address,
            "postcode",
            "FIXME",
            &StreetNormalizer::default(),
            &mut tables,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(address, None);
        assert_eq!(diagnostics.address_types.get("postcode"), Some(&1));
    }

    #[test]
    fn street_is_normalized_and_registered() {
        let mut address = None;
        let mut tables = PrefixTables::new();
        let mut diagnostics = Diagnostics::default();
        let normalizer = StreetNormalizer::default();
        for (part, value) in [
            ("street", "булевард Витоша"),
            ("suburb", " Лозенец "),
            ("housenumber", "12"),
        ] {
            apply_address_tag(
                &mut address,
                part,
                value,
                &normalizer,
                &mut tables,
                &mut diagnostics,
            )
            .unwrap();
        }

        assert_eq!(
            address,
            Some(Address {
                street: Some("бул. Витоша".to_owned()),
                postcode: None,
                suburb: Some("Лозенец".to_owned()),
            })
        );
        assert_eq!(tables.lookup("витоша").map(|(_, name)| name), Some("бул. Витоша"));
        assert_eq!(diagnostics.address_types.get("housenumber"), Some(&1));
        assert_eq!(diagnostics.street_names.get("бул. Витоша"), Some(&1));
    }

    #[test]
    fn skipped_street_leaves_address_untouched() {
        let mut address = None;
        let mut tables = PrefixTables::new();
        let mut diagnostics = Diagnostics::default();
        apply_address_tag(
            &mut address,
            "street",
            "http://example.org",
            &StreetNormalizer::default(),
            &mut tables,
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(address, None);
        assert!(tables.is_empty());
        assert_eq!(diagnostics.address_types.get("street"), Some(&1));
    }
}
