//! Streaming extraction of `node` and `way` elements from OSM XML.
//!
//! The document is read event by event. Only the subtree of a collected
//! element is materialised, and it is handed to the caller as an owned
//! [`RawElement`]; everything else is discarded as soon as it is read.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::element::RawElement;
use crate::error::ParseError;

const COLLECTED_ITEMS: [&[u8]; 2] = [b"node", b"way"];

fn is_collected(name: &[u8]) -> bool {
    COLLECTED_ITEMS.contains(&name)
}

enum Step {
    Open(RawElement),
    Leaf(RawElement),
    Skip,
    Enter,
    Close,
    Eof,
}

impl Step {
    /// Converts an event into an owned step so the read buffer can be reused.
    ///
    /// With `collect_all` every element is kept (inside a collected subtree);
    /// otherwise only collected top-level items are.
    fn from_event(event: Event<'_>, collect_all: bool) -> Result<Self, quick_xml::Error> {
        let step = match event {
            Event::Start(start) if collect_all || is_collected(start.name().as_ref()) => {
                Step::Open(RawElement::from_start(&start)?)
            }
            Event::Start(_) => Step::Enter,
            Event::Empty(start) if collect_all || is_collected(start.name().as_ref()) => {
                Step::Leaf(RawElement::from_start(&start)?)
            }
            Event::End(_) => Step::Close,
            Event::Eof => Step::Eof,
            _ => Step::Skip,
        };
        Ok(step)
    }
}

/// Forward-only iterator over the `node` and `way` elements of a document.
///
/// The iterator is finite and cannot be restarted. After the first error it
/// yields nothing further.
pub struct ElementStream<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    finished: bool,
}

impl ElementStream<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> ElementStream<&'a [u8]> {
    pub fn from_xml_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> ElementStream<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            finished: false,
        }
    }

    fn read_step(&mut self, collect_all: bool) -> Result<Step, ParseError> {
        let step = match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Step::from_event(event, collect_all),
            Err(source) => Err(source),
        };
        self.buf.clear();
        step.map_err(|source| ParseError::Xml {
            position: self.reader.buffer_position(),
            source,
        })
    }

    fn next_element(&mut self) -> Result<Option<RawElement>, ParseError> {
        loop {
            match self.read_step(false)? {
                Step::Open(element) => return self.read_subtree(element).map(Some),
                Step::Leaf(element) => return Ok(Some(element)),
                Step::Enter => self.depth += 1,
                Step::Close => self.depth = self.depth.saturating_sub(1),
                Step::Eof if self.depth > 0 => {
                    return Err(ParseError::UnexpectedEof {
                        element: "document".to_owned(),
                    })
                }
                Step::Eof => return Ok(None),
                Step::Skip => {}
            }
        }
    }

    /// Reads everything up to the end tag matching `root`.
    fn read_subtree(&mut self, root: RawElement) -> Result<RawElement, ParseError> {
        let mut stack = vec![root];
        loop {
            match self.read_step(true)? {
                Step::Open(element) => stack.push(element),
                Step::Leaf(element) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_child(element);
                    }
                }
                Step::Close => {
                    let Some(done) = stack.pop() else {
                        continue;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(done),
                        None => return Ok(done),
                    }
                }
                Step::Eof => {
                    let element = stack
                        .first()
                        .map(|element| element.name().to_owned())
                        .unwrap_or_default();
                    return Err(ParseError::UnexpectedEof { element });
                }
                Step::Enter | Step::Skip => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<RawElement, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for ElementStream<R> {}

/// Counts every element in a document by tag name.
pub fn count_elements<R: BufRead>(source: R) -> Result<BTreeMap<String, u64>, ParseError> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut counts = BTreeMap::new();
    let mut buf = Vec::new();

    loop {
        let name = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                Some(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => break,
            Ok(_) => None,
            Err(source) => {
                return Err(ParseError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
        };
        if let Some(name) = name {
            *counts.entry(name).or_insert(0) += 1;
        }
        buf.clear();
    }

    Ok(counts)
}

/// [`count_elements`] over a file on disk.
pub fn count_elements_in_file(path: &Path) -> Result<BTreeMap<String, u64>, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    count_elements(BufReader::new(file))
}
