//! Core types for FriendKit

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sex of a user as written to reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Map the API's numeric sex code (1 = female, 2 = male)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Sex::Female),
            2 => Some(Sex::Male),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One friend as written to a report
///
/// Field order is the column order of delimited reports and the key order
/// of JSON reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    first_name: String,
    last_name: String,
    country: Option<String>,
    city: Option<String>,
    birth_date: Option<String>,
    sex: Sex,
}

impl UserRecord {
    /// Report column names, in order
    pub const FIELD_NAMES: [&'static str; 6] = [
        "first_name",
        "last_name",
        "country",
        "city",
        "birth_date",
        "sex",
    ];

    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        country: Option<String>,
        city: Option<String>,
        birth_date: Option<String>,
        sex: Sex,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            country,
            city,
            birth_date,
            sex,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// `YYYY-MM-DD`, or `MM-DD` when the year is hidden
    pub fn birth_date(&self) -> Option<&str> {
        self.birth_date.as_deref()
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Field values in column order, absent values as empty strings
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.country.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or(""),
            self.birth_date.as_deref().unwrap_or(""),
            self.sex.as_str(),
        ]
    }
}

/// Nested `{id, title}` object used by the API for country and city
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One element of the `items` array of a `friends.get` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFriendEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub country: Option<Place>,
    #[serde(default)]
    pub city: Option<Place>,
    /// `D.M.YYYY` or `D.M`
    #[serde(default)]
    pub bdate: Option<String>,
    #[serde(default)]
    pub sex: Option<i64>,
    /// Set to `deleted` or `banned` for deactivated accounts
    #[serde(default)]
    pub deactivated: Option<String>,
}

impl RawFriendEntry {
    pub fn is_deactivated(&self) -> bool {
        self.deactivated.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// API access token
///
/// `Debug` output never contains the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// API response envelope: either `response` or `error` is set
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageResponse {
    #[allow(dead_code)]
    #[serde(default)]
    pub count: u64,
    /// Decoded one by one so a malformed entry is reported on its own
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}
