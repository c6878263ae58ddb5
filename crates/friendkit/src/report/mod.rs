//! Report sinks
//!
//! Design: a sink is bound to one file. Creating it writes the opening
//! framing (header row or `[`), `add` appends a batch of records and
//! `complete` writes the closing framing. Any call after `complete` fails
//! with [`FriendsError::SinkCompleted`].

mod delimited;
mod json;

pub use delimited::DelimitedSink;
pub use json::{JsonFraming, JsonSink};

use crate::error::FriendsError;
use crate::types::UserRecord;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Report file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Tab-separated values
    Tsv,
    /// One JSON object per line inside `[` and `]`
    Json,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Csv, ReportFormat::Tsv, ReportFormat::Json];

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Tsv => "tsv",
            ReportFormat::Json => "json",
        }
    }

    /// Path of the report file for a base path
    ///
    /// The extension is appended, so `results/res.v1` becomes
    /// `results/res.v1.csv`.
    pub fn report_path(&self, base: impl AsRef<Path>) -> PathBuf {
        let mut path = OsString::from(base.as_ref().as_os_str());
        path.push(".");
        path.push(self.extension());
        PathBuf::from(path)
    }

    /// Create the report file for `base` and write its opening framing
    pub fn create_sink(
        &self,
        base: impl AsRef<Path>,
        options: &SinkOptions,
    ) -> Result<Box<dyn ReportSink>, FriendsError> {
        let path = self.report_path(base);
        let sink: Box<dyn ReportSink> = match self {
            ReportFormat::Csv => Box::new(DelimitedSink::create(path, b',')?),
            ReportFormat::Tsv => Box::new(DelimitedSink::create(path, b'\t')?),
            ReportFormat::Json => Box::new(JsonSink::create(path, options.json_framing)?),
        };
        Ok(sink)
    }
}

impl FromStr for ReportFormat {
    type Err = FriendsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "tsv" => Ok(ReportFormat::Tsv),
            "json" => Ok(ReportFormat::Json),
            _ => Err(FriendsError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Options applied when creating a sink
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkOptions {
    /// Framing of JSON reports
    pub json_framing: JsonFraming,
}

/// Destination for normalized records
pub trait ReportSink {
    /// Path of the file being written
    fn path(&self) -> &Path;

    /// Append a batch of records in order
    fn add(&mut self, records: &[UserRecord]) -> Result<(), FriendsError>;

    /// Write closing framing; must be called exactly once
    fn complete(&mut self) -> Result<(), FriendsError>;
}
