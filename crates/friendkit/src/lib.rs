//! FriendKit - VK friend list export library
//!
//! This crate fetches a user's friends from the VK `friends.get` API method
//! and writes them to a CSV, TSV or JSON report.
//!
//! ## Pipeline
//!
//! 1. [`VkFriendsClient`] asks for the friend count, then requests the
//!    friends page by page, pausing between requests.
//! 2. [`normalize_batch`] turns each page into [`UserRecord`]s, dropping
//!    deactivated accounts.
//! 3. A [`ReportSink`] appends every batch to the report file and closes it
//!    after the last page.
//!
//! [`export_friends`] runs the whole pipeline:
//!
//! ```no_run
//! use friendkit::{export_friends, ReportFormat, SinkOptions, VkFriendsClient};
//!
//! # async fn run() -> Result<(), friendkit::FriendsError> {
//! let client = VkFriendsClient::builder("access-token", "1").build()?;
//! let mut sink = ReportFormat::Csv.create_sink("report", &SinkOptions::default())?;
//! let summary = export_friends(&client, sink.as_mut(), 1000).await?;
//! println!("{} friends written", summary.written);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod export;
pub mod fetcher;
pub mod normalize;
pub mod report;
mod types;

pub use error::FriendsError;
pub use export::{export_friends, page_count, ExportSummary, DEFAULT_PAGE_SIZE};
pub use fetcher::{
    FriendsSource, VkFriendsClient, VkFriendsClientBuilder, DEFAULT_API_BASE,
    DEFAULT_API_VERSION, DEFAULT_REQUEST_DELAY,
};
pub use normalize::{normalize_batch, normalize_birth_date, normalize_entry};
pub use report::{
    DelimitedSink, JsonFraming, JsonSink, ReportFormat, ReportSink, SinkOptions,
};
pub use types::{AccessToken, Place, RawFriendEntry, Sex, UserRecord};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Everruns FriendKit/1.0";
