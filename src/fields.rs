//! Attribute and child readers for a single collected element.

use crate::diagnostics::Diagnostics;
use crate::element::RawElement;
use crate::error::ParseError;
use crate::record::{ElementKind, Location, Timestamp, User};

pub fn parse_user(element: &RawElement, diagnostics: &mut Diagnostics) -> User {
    let name = element.attr("user").map(str::to_owned);
    let id = element.attr("uid").map(str::to_owned);

    if name.is_none() {
        diagnostics.missing_username();
    }
    if id.is_none() {
        diagnostics.missing_uid();
    }

    User { name, id }
}

/// Reads `lat`/`lon`; a lone coordinate is as good as none.
pub fn parse_location(
    element: &RawElement,
    kind: ElementKind,
    diagnostics: &mut Diagnostics,
) -> Result<Option<Location>, ParseError> {
    let Some(lat) = element.attr("lat") else {
        diagnostics.missing_lat(kind);
        return Ok(None);
    };
    let Some(lon) = element.attr("lon") else {
        diagnostics.missing_lon();
        return Ok(None);
    };

    let lat = parse_coordinate(element, "lat", lat)?;
    let lon = parse_coordinate(element, "lon", lon)?;
    Ok(Some(Location::new(lat, lon)))
}

fn parse_coordinate(
    element: &RawElement,
    attribute: &'static str,
    value: &str,
) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|source| ParseError::InvalidCoordinate {
            id: element.attr("id").unwrap_or_default().to_owned(),
            attribute,
            value: value.to_owned(),
            source,
        })
}

/// `ref` of every direct `nd` child, in document order.
pub fn parse_node_refs(element: &RawElement) -> Result<Vec<String>, ParseError> {
    element
        .children_named("nd")
        .map(|nd| {
            nd.attr("ref")
                .map(str::to_owned)
                .ok_or_else(|| ParseError::MissingAttribute {
                    element: nd.name().to_owned(),
                    attribute: "ref",
                })
        })
        .collect()
}

pub fn parse_common_field(
    element: &RawElement,
    field: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    let value = element.attr(field).map(str::to_owned);
    if value.is_none() {
        diagnostics.missing_common_field(field);
    }
    value
}

pub fn parse_timestamp(element: &RawElement, diagnostics: &mut Diagnostics) -> Option<Timestamp> {
    parse_common_field(element, "timestamp", diagnostics).map(|raw| Timestamp::parse(&raw))
}
