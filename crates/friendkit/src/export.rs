//! Friend list export pipeline
//!
//! Fetches the friend count, then every page, normalizes each page and
//! appends it to the report before asking for the next one.

use crate::error::FriendsError;
use crate::fetcher::FriendsSource;
use crate::normalize::normalize_batch;
use crate::report::ReportSink;
use tracing::info;

/// Default number of friends requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Outcome of a completed export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Friend count reported by the API
    pub total: u64,
    /// Number of page requests issued
    pub pages: u64,
    /// Records written to the report
    pub written: u64,
    /// Entries dropped as deactivated
    pub skipped: u64,
}

/// Number of page requests for `total` friends
///
/// Always one more than the number of full pages, so an exact multiple of
/// `page_size` ends with an empty page.
pub fn page_count(total: u64, page_size: u32) -> Result<u64, FriendsError> {
    if page_size == 0 {
        return Err(FriendsError::InvalidPageSize);
    }
    Ok(total / u64::from(page_size) + 1)
}

/// Export every friend from `source` into `sink` and complete it
///
/// The first error aborts the export; the sink is then left incomplete.
pub async fn export_friends<S>(
    source: &S,
    sink: &mut dyn ReportSink,
    page_size: u32,
) -> Result<ExportSummary, FriendsError>
where
    S: FriendsSource + ?Sized,
{
    if page_size == 0 {
        return Err(FriendsError::InvalidPageSize);
    }

    let total = source.fetch_count().await?;
    let pages = page_count(total, page_size)?;
    let mut summary = ExportSummary {
        total,
        pages,
        ..Default::default()
    };

    for page in 0..pages {
        let offset = page * u64::from(page_size);
        let entries = source.fetch_page(offset, page_size).await?;
        let received = entries.len() as u64;
        let records = normalize_batch(entries)?;
        sink.add(&records)?;

        summary.written += records.len() as u64;
        summary.skipped += received - records.len() as u64;
    }
    sink.complete()?;

    info!(
        path = %sink.path().display(),
        total = summary.total,
        pages = summary.pages,
        written = summary.written,
        skipped = summary.skipped,
        "Report completed"
    );
    Ok(summary)
}
