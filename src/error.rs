//! Error types shared by the extraction pipeline.

use std::num::ParseFloatError;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a parse run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open OSM XML file at {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML near byte {position}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("document ended inside <{element}>")]
    UnexpectedEof { element: String },
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("invalid {attribute} {value:?} on element {id}")]
    InvalidCoordinate {
        id: String,
        attribute: &'static str,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

/// Reasons a single element is dropped from the output while the run goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Postcode parsed as an integer outside `[1000, 2000)`.
    PostcodeOutOfRange(i64),
    /// Postcode that is neither numeric nor a FIXME marker.
    InvalidPostcode(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostcodeOutOfRange(code) => write!(f, "postcode {code} out of range"),
            Self::InvalidPostcode(code) => write!(f, "invalid postcode {code:?}"),
        }
    }
}

/// Errors raised while handing records to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output directory {path:?}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV record")]
    Csv(#[from] csv::Error),
    #[error("failed to serialize record as JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading correction tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read corrections file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode corrections file {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
