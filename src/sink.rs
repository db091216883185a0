//! Destinations for finished records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;

use crate::error::SinkError;
use crate::record::Record;

/// Accepts finished records one at a time.
pub trait RecordSink {
    fn add_record(&mut self, record: &Record) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl RecordSink for Vec<Record> {
    fn add_record(&mut self, record: &Record) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Hands every record to `sink` in order, then flushes it.
pub fn write_records<S: RecordSink + ?Sized>(
    records: &[Record],
    sink: &mut S,
) -> Result<usize, SinkError> {
    for record in records {
        sink.add_record(record)?;
    }
    sink.flush()?;
    Ok(records.len())
}

fn create_output(path: &Path) -> Result<File, SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(File::create(path)?)
}

const CSV_HEADER: [&str; 16] = [
    "id",
    "type",
    "user_name",
    "user_id",
    "timestamp",
    "changeset",
    "version",
    "lat",
    "lon",
    "node_refs",
    "amenity",
    "name",
    "street",
    "postcode",
    "suburb",
    "has_address",
];

/// Flat CSV rows, one per record; way node refs are joined with `;`.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
}

impl CsvSink<File> {
    pub fn from_path(path: &Path) -> Result<Self, SinkError> {
        Self::new(create_output(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(output: W) -> Result<Self, SinkError> {
        let mut writer = Writer::from_writer(output);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn add_record(&mut self, record: &Record) -> Result<(), SinkError> {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let location = record.location();
        let address = record.address.as_ref();
        self.writer.write_record([
            record.id.clone(),
            record.kind().as_str().to_owned(),
            text(&record.user.name),
            text(&record.user.id),
            record
                .timestamp
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            text(&record.changeset),
            text(&record.version),
            location.map(|l| l.lat().to_string()).unwrap_or_default(),
            location.map(|l| l.lon().to_string()).unwrap_or_default(),
            record.node_refs().join(";"),
            text(&record.amenity),
            text(&record.name),
            address.map(|a| text(&a.street)).unwrap_or_default(),
            address
                .and_then(|a| a.postcode)
                .map(|code| code.to_string())
                .unwrap_or_default(),
            address.map(|a| text(&a.suburb)).unwrap_or_default(),
            address.is_some().to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn from_path(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(BufWriter::new(create_output(path)?)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn add_record(&mut self, record: &Record) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Address, ElementData, Location, Timestamp, User};
    use csv::ReaderBuilder;
    use tempfile::tempdir;

    fn sample_records() -> Vec<Record> {
        vec![
            Record {
                id: "1".to_owned(),
                data: ElementData::Node {
                    location: Some(Location::new(42.5, 23.25)),
                },
                user: User {
                    name: Some("sofia".to_owned()),
                    id: Some("42".to_owned()),
                },
                timestamp: Some(Timestamp::parse("2020-01-01T00:00:00Z")),
                changeset: Some("77".to_owned()),
                version: Some("1".to_owned()),
                amenity: Some("cafe".to_owned()),
                name: None,
                address: Some(Address {
                    street: Some("ул. Шипка".to_owned()),
                    postcode: Some(1504),
                    suburb: None,
                }),
            },
            Record {
                id: "10".to_owned(),
                data: ElementData::Way {
                    node_refs: vec!["1".to_owned(), "2".to_owned(), "1".to_owned()],
                },
                user: User::default(),
                timestamp: Some(Timestamp::Raw("unknown".to_owned())),
                changeset: None,
                version: None,
                amenity: None,
                name: Some("Паметник".to_owned()),
                address: None,
            },
        ]
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let records = sample_records();
        let mut sink: Vec<Record> = Vec::new();
        assert_eq!(write_records(&records, &mut sink).unwrap(), 2);
        assert_eq!(sink, records);
    }

    #[test]
    fn csv_sink_writes_flat_rows() {
        let dir = tempdir().unwrap();
        let out_path = dir.path().join("nested/out.csv");
        let mut sink = CsvSink::from_path(&out_path).unwrap();
        write_records(&sample_records(), &mut sink).unwrap();
        drop(sink);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .from_path(&out_path)
            .unwrap();
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|row| row.unwrap().iter().map(|value| value.to_string()).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CSV_HEADER);
        assert_eq!(
            rows[1],
            vec![
                "1",
                "node",
                "sofia",
                "42",
                "2020-01-01T00:00:00Z",
                "77",
                "1",
                "42.5",
                "23.25",
                "",
                "cafe",
                "",
                "ул. Шипка",
                "1504",
                "",
                "true",
            ]
        );
        assert_eq!(rows[2][1], "way");
        assert_eq!(rows[2][4], "unknown");
        assert_eq!(rows[2][9], "1;2;1");
        assert_eq!(rows[2][11], "Паметник");
        assert_eq!(rows[2][15], "false");
    }

    #[test]
    fn csv_sink_into_inner_returns_the_buffer() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        write_records(&sample_records()[1..], &mut sink).unwrap();
        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,type,user_name"));
        assert!(lines[1].starts_with("10,way,"));
    }

    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        write_records(&sample_records(), &mut sink).unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "node");
        assert_eq!(lines[0]["location"], serde_json::json!([42.5, 23.25]));
        assert_eq!(lines[0]["address"]["postcode"], 1504);
        assert_eq!(lines[1]["type"], "way");
        assert_eq!(lines[1]["node_refs"], serde_json::json!(["1", "2", "1"]));
        assert!(lines[1].get("address").is_none());
    }
}
