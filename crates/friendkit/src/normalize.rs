//! Conversion of raw `friends.get` items into report records
//!
//! Deactivated accounts are dropped, nested country/city objects are
//! flattened to their titles, sex codes become [`Sex`] and birth dates are
//! rewritten in ISO order.

use crate::error::FriendsError;
use crate::types::{Place, RawFriendEntry, Sex, UserRecord};
use chrono::NaiveDate;
use tracing::warn;

/// Input format of birth dates
const API_DATE_FORMAT: &str = "%d.%m.%Y";

/// Leap year used to validate day-month dates without a year
const ANCHOR_YEAR: i32 = 2000;

/// Convert one raw entry into a record
///
/// Returns `Ok(None)` for deactivated accounts.
pub fn normalize_entry(entry: RawFriendEntry) -> Result<Option<UserRecord>, FriendsError> {
    if entry.is_deactivated() {
        return Ok(None);
    }

    let id = entry.id.unwrap_or_default();
    let sex = match entry.sex {
        Some(code) => Sex::from_code(code).ok_or_else(|| {
            FriendsError::Normalize(format!("unknown sex code {} for user {}", code, id))
        })?,
        None => {
            return Err(FriendsError::Normalize(format!(
                "missing field `sex` for user {}",
                id
            )))
        }
    };

    let first_name = entry.first_name.ok_or_else(|| missing_field("first_name", id))?;
    let last_name = entry.last_name.ok_or_else(|| missing_field("last_name", id))?;

    Ok(Some(UserRecord::new(
        first_name,
        last_name,
        place_title(entry.country),
        place_title(entry.city),
        normalize_birth_date(entry.bdate.as_deref()),
        sex,
    )))
}

/// Convert a page of raw entries, keeping input order
pub fn normalize_batch(entries: Vec<RawFriendEntry>) -> Result<Vec<UserRecord>, FriendsError> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(record) = normalize_entry(entry)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Title of a nested country/city object
pub fn place_title(place: Option<Place>) -> Option<String> {
    place.and_then(|p| p.title)
}

/// Rewrite `D.M.YYYY` as `YYYY-MM-DD` and `D.M` as `MM-DD`
///
/// The year must have exactly four digits. Any other shape, or a date that
/// does not exist, yields `None`.
pub fn normalize_birth_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let parts: Vec<&str> = raw.split('.').collect();
    if !parts.iter().all(|part| is_date_component(part)) {
        warn!(bdate = raw, "Unparseable birth date");
        return None;
    }

    let parsed = match parts.as_slice() {
        [_, _, year] if year.len() == 4 => NaiveDate::parse_from_str(raw, API_DATE_FORMAT)
            .map(|date| date.format("%Y-%m-%d").to_string()),
        [_, _, _] => {
            warn!(bdate = raw, "Birth year is not four digits");
            return None;
        }
        [_, _] => NaiveDate::parse_from_str(&format!("{}.{}", raw, ANCHOR_YEAR), API_DATE_FORMAT)
            .map(|date| date.format("%m-%d").to_string()),
        _ => return None,
    };

    match parsed {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(bdate = raw, error = %e, "Unparseable birth date");
            None
        }
    }
}

/// Non-empty run of ASCII digits; rejects signs and spaces that chrono tolerates
fn is_date_component(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn missing_field(field: &str, id: i64) -> FriendsError {
    FriendsError::Normalize(format!("missing field `{}` for user {}", field, id))
}
