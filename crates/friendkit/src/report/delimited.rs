//! CSV and TSV reports

use crate::error::FriendsError;
use crate::report::ReportSink;
use crate::types::UserRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Delimited report: a header row, then one row per record
///
/// Fields containing the delimiter, quotes or newlines are quoted the
/// standard CSV way. Rows end with `\r\n`. `complete` writes nothing.
pub struct DelimitedSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    completed: bool,
}

impl DelimitedSink {
    /// Create (or truncate) `path` and write the header row
    pub fn create(path: impl Into<PathBuf>, delimiter: u8) -> Result<Self, FriendsError> {
        let path = path.into();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_path(&path)?;
        writer.write_record(UserRecord::FIELD_NAMES)?;
        writer.flush()?;
        debug!(path = %path.display(), "Created delimited report");

        Ok(Self {
            path,
            writer,
            completed: false,
        })
    }
}

impl ReportSink for DelimitedSink {
    fn path(&self) -> &Path {
        &self.path
    }

    fn add(&mut self, records: &[UserRecord]) -> Result<(), FriendsError> {
        if self.completed {
            return Err(FriendsError::SinkCompleted);
        }
        for record in records {
            self.writer.write_record(record.to_row())?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn complete(&mut self) -> Result<(), FriendsError> {
        if self.completed {
            return Err(FriendsError::SinkCompleted);
        }
        self.writer.flush()?;
        self.completed = true;
        Ok(())
    }
}
