//! HTTP request executor shared by all collectors.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::retry::retry_with_backoff;

/// Generic GET-JSON executor with bounded timeout and classified errors.
///
/// Handles rate limiting (429), not-found (404), and other non-2xx responses
/// as typed [`FetchError`] variants. Transient errors (429, network failures,
/// 5xx) are automatically retried with exponential backoff up to
/// `max_retries` additional attempts.
///
/// Holds no mutable state; cheap to clone (the inner `reqwest::Client` is an
/// `Arc` internally), so one instance is constructed at startup and shared by
/// every collector.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl FetchClient {
    /// Creates a `FetchClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable errors. Set to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches `url` and deserializes the JSON body into `T`, with automatic
    /// retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`FetchError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`FetchError::NotFound`] — HTTP 404 (not retried).
    /// - [`FetchError::UnexpectedStatus`] — other non-2xx (5xx retried, 4xx not).
    /// - [`FetchError::Http`] — network failure after all retries exhausted.
    /// - [`FetchError::Deserialize`] — body is not valid JSON for `T` (not retried).
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move { self.get_json_once(&url).await }
        })
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| FetchError::Deserialize {
            context: url.to_owned(),
            source: e,
        })
    }
}
