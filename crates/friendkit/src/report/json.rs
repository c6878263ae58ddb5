//! JSON reports

use crate::error::FriendsError;
use crate::report::ReportSink;
use crate::types::UserRecord;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How records are separated inside the JSON array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFraming {
    /// Every record is followed by `,\n`, including the last one.
    /// Existing consumers of the reports expect this layout.
    #[default]
    Legacy,
    /// Records separated by `,\n`; the file is a valid JSON array
    Strict,
}

/// JSON report: `[`, one object per line, `]`
pub struct JsonSink {
    path: PathBuf,
    writer: BufWriter<File>,
    framing: JsonFraming,
    written: usize,
    completed: bool,
}

impl JsonSink {
    /// Create (or truncate) `path` and write the opening bracket
    pub fn create(path: impl Into<PathBuf>, framing: JsonFraming) -> Result<Self, FriendsError> {
        let path = path.into();
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(b"[")?;
        writer.flush()?;
        debug!(path = %path.display(), ?framing, "Created JSON report");

        Ok(Self {
            path,
            writer,
            framing,
            written: 0,
            completed: false,
        })
    }
}

impl ReportSink for JsonSink {
    fn path(&self) -> &Path {
        &self.path
    }

    fn add(&mut self, records: &[UserRecord]) -> Result<(), FriendsError> {
        if self.completed {
            return Err(FriendsError::SinkCompleted);
        }
        for record in records {
            let line = record_to_json(record)?;
            match self.framing {
                JsonFraming::Legacy => {
                    self.writer.write_all(&line)?;
                    self.writer.write_all(b",\n")?;
                }
                JsonFraming::Strict => {
                    if self.written > 0 {
                        self.writer.write_all(b",\n")?;
                    }
                    self.writer.write_all(&line)?;
                }
            }
            self.written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn complete(&mut self) -> Result<(), FriendsError> {
        if self.completed {
            return Err(FriendsError::SinkCompleted);
        }
        self.writer.write_all(b"]")?;
        self.writer.flush()?;
        self.completed = true;
        Ok(())
    }
}

/// Serialize one record with `", "` and `": "` separators
///
/// Absent fields are written as `null`; non-ASCII text is kept as is.
pub fn record_to_json(record: &UserRecord) -> Result<Vec<u8>, FriendsError> {
    let mut buf = Vec::with_capacity(160);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    record.serialize(&mut ser)?;
    Ok(buf)
}

/// Compact formatter with a space after `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_records;
    use std::fs;

    #[test]
    fn test_creation_writes_bracket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        JsonSink::create(&path, JsonFraming::Legacy).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[");
    }

    #[test]
    fn test_record_to_json() {
        let json = record_to_json(&sample_records()[0]).unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            r#"{"first_name": "Ирина", "last_name": "Григорьева", "country": "Россия", "city": "Екатеринбург", "birth_date": "04-17", "sex": "Female"}"#
        );
    }

    #[test]
    fn test_absent_fields_are_null() {
        let json = String::from_utf8(record_to_json(&sample_records()[2]).unwrap()).unwrap();
        assert!(json.contains(r#""birth_date": null"#));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_legacy_framing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let records = sample_records();
        let mut sink = JsonSink::create(&path, JsonFraming::Legacy).unwrap();
        sink.add(&records[..1]).unwrap();
        sink.add(&records[1..2]).unwrap();
        sink.complete().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let first = String::from_utf8(record_to_json(&records[0]).unwrap()).unwrap();
        let second = String::from_utf8(record_to_json(&records[1]).unwrap()).unwrap();
        assert_eq!(content, format!("[{},\n{},\n]", first, second));
    }

    #[test]
    fn test_strict_framing_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let records = sample_records();
        let mut sink = JsonSink::create(&path, JsonFraming::Strict).unwrap();
        sink.add(&records[..2]).unwrap();
        sink.add(&records[2..]).unwrap();
        sink.complete().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<UserRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_strict_framing_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut sink = JsonSink::create(&path, JsonFraming::Strict).unwrap();
        sink.complete().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_complete_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut sink = JsonSink::create(&path, JsonFraming::Legacy).unwrap();
        sink.complete().unwrap();
        assert!(matches!(sink.complete(), Err(FriendsError::SinkCompleted)));
        assert!(matches!(sink.add(&[]), Err(FriendsError::SinkCompleted)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
