use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Kind of OSM element a record was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }
}

/// Author of the last edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct User {
    pub name: Option<String>,
    pub id: Option<String>,
}

/// Latitude/longitude pair, serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location(f64, f64);

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(lat, lon)
    }

    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }
}

/// Edit timestamp; kept verbatim when it is not RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Self {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|parsed| Self::Parsed(parsed.with_timezone(&Utc)))
            .unwrap_or_else(|_| Self::Raw(raw.to_owned()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(instant) => {
                f.write_str(&instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Geometry carried by a record, depending on its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementData {
    Node {
        #[serde(serialize_with = "serialize_location")]
        location: Option<Location>,
    },
    Way { node_refs: Vec<String> },
}

/// A node without coordinates is exported with an empty `location` array.
fn serialize_location<S: Serializer>(
    location: &Option<Location>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match location {
        Some(location) => location.serialize(serializer),
        None => serializer.serialize_seq(Some(0))?.end(),
    }
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Node { .. } => ElementKind::Node,
            Self::Way { .. } => ElementKind::Way,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
}

/// One parsed node or way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub data: ElementData,
    pub user: User,
    pub timestamp: Option<Timestamp>,
    pub changeset: Option<String>,
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Record {
    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn location(&self) -> Option<Location> {
        match &self.data {
            ElementData::Node { location } => *location,
            ElementData::Way { .. } => None,
        }
    }

    pub fn node_refs(&self) -> &[String] {
        match &self.data {
            ElementData::Way { node_refs } => node_refs,
            ElementData::Node { .. } => &[],
        }
    }

    pub fn street(&self) -> Option<&str> {
        self.address.as_ref()?.street.as_deref()
    }
}
