//! HTTP-backed user profile repository
//!
//! Implements the `UserProfileRepository` port against the hosted
//! backend's rows REST API (`/rest/v1/user_profiles`). Reads by id go
//! through an in-process cache; the whole cache is dropped on sign-out so
//! no rows leak across identities.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use tracing::{debug, instrument, warn};
use uninest_core::UserProfileRepository;
use uninest_domain::{Config, ProfileUpdate, Result, UniNestError, UserProfile};

use crate::provider::AccessTokenProvider;

/// Maximum number of cached profile rows
const CACHE_MAX_CAPACITY: u64 = 1024;
/// Cached rows expire on their own after this long even without a sign-out
const CACHE_TTL: Duration = Duration::from_secs(300);

const TABLE_PATH: &str = "/rest/v1/user_profiles";

/// Configuration for the profile rows API
#[derive(Debug, Clone)]
pub struct ProfileApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProfileApiConfig {
    /// Derive the rows-API settings from the application config
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_key: config.provider.api_key.clone(),
            timeout: Duration::from_secs(config.http.timeout_seconds),
        }
    }
}

/// REST implementation of `UserProfileRepository`
pub struct HttpUserProfileRepository {
    http: reqwest::Client,
    config: ProfileApiConfig,
    tokens: Arc<dyn AccessTokenProvider>,
    cache: Cache<String, UserProfile>,
}

impl HttpUserProfileRepository {
    /// Create a new repository instance
    ///
    /// # Errors
    /// Returns `UniNestError::Config` if the HTTP client cannot be built.
    pub fn new(config: ProfileApiConfig, tokens: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| UniNestError::Config(format!("failed to build HTTP client: {err}")))?;

        let cache =
            Cache::builder().max_capacity(CACHE_MAX_CAPACITY).time_to_live(CACHE_TTL).build();

        Ok(Self { http, config, tokens, cache })
    }

    fn table_url(&self) -> String {
        format!("{}{TABLE_PATH}", self.config.base_url)
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
            .header("Content-Type", "application/json"))
    }

    /// Send a request and parse the row array the rows API returns
    async fn execute_rows(&self, request: RequestBuilder) -> Result<Vec<UserProfile>> {
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(storage_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|err| UniNestError::Storage(format!("malformed rows response: {err}")))
    }
}

#[async_trait]
impl UserProfileRepository for HttpUserProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        if let Some(cached) = self.cache.get(id).await {
            debug!(user_id = id, "profile served from cache");
            return Ok(Some(cached));
        }

        let url = format!("{}?id=eq.{}&select=*", self.table_url(), urlencoding::encode(id));
        let request = self.request(Method::GET, &url).await?;
        let rows = self.execute_rows(request).await?;

        match rows.into_iter().next() {
            Some(profile) => {
                self.cache.insert(profile.id.clone(), profile.clone()).await;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let url =
            format!("{}?email=eq.{}&select=*", self.table_url(), urlencoding::encode(email));
        let request = self.request(Method::GET, &url).await?;
        let rows = self.execute_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile> {
        let request = self
            .request(Method::POST, &self.table_url())
            .await?
            .header("Prefer", "return=representation")
            .json(&profile);

        let rows = self.execute_rows(request).await?;
        let inserted = rows.into_iter().next().ok_or_else(|| {
            UniNestError::Storage("insert returned no representation".to_string())
        })?;

        self.cache.insert(inserted.id.clone(), inserted.clone()).await;
        Ok(inserted)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: ProfileUpdate) -> Result<UserProfile> {
        let url = format!("{}?id=eq.{}", self.table_url(), urlencoding::encode(id));
        let request = self
            .request(Method::PATCH, &url)
            .await?
            .header("Prefer", "return=representation")
            .json(&patch);

        let rows = self.execute_rows(request).await?;
        let updated = rows
            .into_iter()
            .next()
            .ok_or_else(|| UniNestError::NotFound(format!("profile {id}")))?;

        self.cache.insert(updated.id.clone(), updated.clone()).await;
        Ok(updated)
    }

    async fn invalidate_cache(&self) {
        self.cache.invalidate_all();
        // run_pending_tasks makes the invalidation visible immediately
        // instead of lazily on the next access.
        self.cache.run_pending_tasks().await;
        debug!("profile cache invalidated");
    }
}

fn map_transport_error(err: reqwest::Error) -> UniNestError {
    UniNestError::Network(err.to_string())
}

/// Map a non-success rows-API response to the right error variant
fn storage_error(status: StatusCode, body: &str) -> UniNestError {
    match status {
        StatusCode::CONFLICT => UniNestError::Conflict(extract_message(body)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            UniNestError::Auth(extract_message(body))
        }
        status if status.is_server_error() => {
            UniNestError::Network(format!("storage error {status}: {}", extract_message(body)))
        }
        status => {
            warn!(%status, "unexpected rows API response");
            UniNestError::Storage(format!("{status}: {}", extract_message(body)))
        }
    }
}

/// Pull the `message` field out of a rows-API error body, falling back to
/// the raw body
fn extract_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_status_maps_to_conflict_error() {
        let err = storage_error(
            StatusCode::CONFLICT,
            r#"{"message":"duplicate key value violates unique constraint"}"#,
        );
        assert!(matches!(err, UniNestError::Conflict(msg) if msg.contains("duplicate key")));
    }

    #[test]
    fn auth_statuses_map_to_auth_error() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = storage_error(status, r#"{"message":"JWT expired"}"#);
            assert!(matches!(err, UniNestError::Auth(_)));
        }
    }

    #[test]
    fn server_errors_map_to_network_error() {
        let err = storage_error(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
        assert!(matches!(err, UniNestError::Network(_)));
    }

    #[test]
    fn message_extraction_falls_back_to_raw_body() {
        assert_eq!(extract_message("plain text"), "plain text");
        assert_eq!(extract_message(r#"{"message":"boom"}"#), "boom");
    }
}
