//! Paginated friend list retrieval
//!
//! Design: [`FriendsSource`] is the seam between the export pipeline and the
//! network. [`VkFriendsClient`] implements it against the VK `friends.get`
//! method and keeps a fixed delay between consecutive requests.

use crate::error::FriendsError;
use crate::types::{AccessToken, CountResponse, Envelope, PageResponse, RawFriendEntry};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.vk.com/method/";

/// Default API version
pub const DEFAULT_API_VERSION: &str = "5.81";

/// Default pause between two requests (API rate limit)
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// API method returning the friend list
const FRIENDS_METHOD: &str = "friends.get";

/// Profile fields requested with every page
const PAGE_FIELDS: &str = "sex,bdate,city,country";

/// Source of a user's friends, one page at a time
#[async_trait]
pub trait FriendsSource: Send + Sync {
    /// Total number of friends reported by the API
    async fn fetch_count(&self) -> Result<u64, FriendsError>;

    /// Friends in name order, starting at `offset`, at most `limit` of them
    async fn fetch_page(&self, offset: u64, limit: u32)
        -> Result<Vec<RawFriendEntry>, FriendsError>;
}

/// Builder for [`VkFriendsClient`]
#[derive(Debug, Clone)]
pub struct VkFriendsClientBuilder {
    access_token: AccessToken,
    user_id: String,
    api_base: String,
    api_version: String,
    request_delay: Duration,
    user_agent: Option<String>,
}

impl VkFriendsClientBuilder {
    /// Set the API base URL (the method name is appended to it)
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the API version sent as `v`
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the pause between two requests
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Validate the parameters and build the client
    pub fn build(self) -> Result<VkFriendsClient, FriendsError> {
        if self.access_token.is_empty() {
            return Err(FriendsError::MissingAccessToken);
        }
        let user_id = self.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(FriendsError::MissingUserId);
        }

        let endpoint = method_url(&self.api_base)?;
        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FriendsError::ClientBuildError)?;

        Ok(VkFriendsClient {
            http,
            endpoint,
            access_token: self.access_token,
            user_id,
            api_version: self.api_version,
            request_delay: self.request_delay,
            last_request: Mutex::new(None),
        })
    }
}

/// `friends.get` client bound to one access token and one target user
#[derive(Debug)]
pub struct VkFriendsClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: AccessToken,
    user_id: String,
    api_version: String,
    request_delay: Duration,
    /// When the previous request finished; held during a request
    last_request: Mutex<Option<Instant>>,
}

impl VkFriendsClient {
    /// Start building a client for `user_id`'s friends
    pub fn builder(
        access_token: impl Into<AccessToken>,
        user_id: impl Into<String>,
    ) -> VkFriendsClientBuilder {
        VkFriendsClientBuilder {
            access_token: access_token.into(),
            user_id: user_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_delay: DEFAULT_REQUEST_DELAY,
            user_agent: None,
        }
    }

    /// Full URL of the `friends.get` method
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Issue one GET with the common parameters plus `extra`
    async fn call<T: DeserializeOwned>(&self, extra: &[(&str, String)]) -> Result<T, FriendsError> {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            sleep_until(previous + self.request_delay).await;
        }

        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("user_id", &self.user_id);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
            query.append_pair("access_token", self.access_token.expose());
            query.append_pair("v", &self.api_version);
        }

        debug!(endpoint = %self.endpoint, user_id = %self.user_id, "Sending request");
        let result = self.send(url).await;
        *last_request = Some(Instant::now());
        result
    }

    async fn send<T: DeserializeOwned>(&self, url: Url) -> Result<T, FriendsError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FriendsError::from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(FriendsError::from_reqwest)?;

        parse_envelope(status, &body).inspect_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Request to VK API failed");
        })
    }
}

#[async_trait]
impl FriendsSource for VkFriendsClient {
    async fn fetch_count(&self) -> Result<u64, FriendsError> {
        let response: CountResponse = self.call(&[]).await?;
        info!(count = response.count, "Number of friends received successfully");
        Ok(response.count)
    }

    async fn fetch_page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<RawFriendEntry>, FriendsError> {
        let params = [
            ("order", "name".to_string()),
            ("fields", PAGE_FIELDS.to_string()),
            ("offset", offset.to_string()),
            ("count", limit.to_string()),
        ];
        let response: PageResponse = self.call(&params).await?;
        let items = decode_entries(response.items)?;
        info!(
            offset,
            received = items.len(),
            "Friends list with information received successfully"
        );
        Ok(items)
    }
}

/// Decode page items, failing on the first entry with an unexpected shape
fn decode_entries(items: Vec<serde_json::Value>) -> Result<Vec<RawFriendEntry>, FriendsError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                FriendsError::Normalize(format!("malformed friend entry at index {}: {}", index, e))
            })
        })
        .collect()
}

/// Join the method name onto the API base URL
fn method_url(base: &str) -> Result<Url, FriendsError> {
    let base = base.trim();
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    let url = Url::parse(&base).map_err(|e| FriendsError::InvalidBaseUrl(format!("{}: {}", base, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(FriendsError::InvalidBaseUrl(format!(
            "{}: must start with http:// or https://",
            base
        )));
    }
    url.join(FRIENDS_METHOD)
        .map_err(|e| FriendsError::InvalidBaseUrl(e.to_string()))
}

/// Unwrap a `{response}` / `{error}` envelope
fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, FriendsError> {
    let envelope = match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(FriendsError::HttpStatus(status.as_u16())),
        Err(e) => return Err(FriendsError::InvalidResponse(e.to_string())),
    };

    if let Some(error) = envelope.error {
        return Err(FriendsError::Api {
            code: error.error_code,
            message: error.error_msg,
        });
    }
    if !status.is_success() {
        return Err(FriendsError::HttpStatus(status.as_u16()));
    }
    envelope
        .response
        .ok_or_else(|| FriendsError::InvalidResponse("missing `response` field".to_string()))
}
