//! Error types for FriendKit

use thiserror::Error;

/// Errors that can occur while fetching, normalizing or writing a report
#[derive(Debug, Error)]
pub enum FriendsError {
    /// Access token is empty
    #[error("Missing required parameter: access token")]
    MissingAccessToken,

    /// Target user id is empty
    #[error("Missing required parameter: user id")]
    MissingUserId,

    /// Page size must be at least one
    #[error("Invalid page size: must be greater than zero")]
    InvalidPageSize,

    /// Report format name is not one of csv, tsv, json
    #[error("Unknown report format: {0} (available formats: csv, tsv, json)")]
    UnknownFormat(String),

    /// API base URL could not be parsed
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Non-success HTTP status without an API error body
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// Body was not the expected JSON envelope
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error envelope
    #[error("VK error {code}: {message}")]
    Api { code: i64, message: String },

    /// Raw friend entry could not be converted into a record
    #[error("Failed to parse friend data: {0}")]
    Normalize(String),

    /// Sink was used after `complete`
    #[error("Report is already completed")]
    SinkCompleted,

    /// Report file I/O failed
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited writer failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FriendsError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FriendsError::Timeout
        } else if err.is_connect() {
            FriendsError::ConnectError(err)
        } else {
            FriendsError::RequestError(err.to_string())
        }
    }

    /// True for errors raised before any network or file activity
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            FriendsError::MissingAccessToken
                | FriendsError::MissingUserId
                | FriendsError::InvalidPageSize
                | FriendsError::UnknownFormat(_)
                | FriendsError::InvalidBaseUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FriendsError::MissingAccessToken.to_string(),
            "Missing required parameter: access token"
        );
        assert_eq!(
            FriendsError::UnknownFormat("xml".to_string()).to_string(),
            "Unknown report format: xml (available formats: csv, tsv, json)"
        );
        assert_eq!(
            FriendsError::Api {
                code: 5,
                message: "User authorization failed: invalid access_token (4).".to_string()
            }
            .to_string(),
            "VK error 5: User authorization failed: invalid access_token (4)."
        );
        assert_eq!(FriendsError::HttpStatus(502).to_string(), "HTTP error: status 502");
        assert_eq!(
            FriendsError::SinkCompleted.to_string(),
            "Report is already completed"
        );
    }

    #[test]
    fn test_input_errors() {
        assert!(FriendsError::InvalidPageSize.is_input_error());
        assert!(FriendsError::UnknownFormat("x".into()).is_input_error());
        assert!(!FriendsError::HttpStatus(500).is_input_error());
        assert!(!FriendsError::Normalize("bad sex code".into()).is_input_error());
    }
}
