use thiserror::Error;

/// Classified errors returned by the fetch layer.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; the server has asked us to back off.
    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    /// HTTP 404. Collectors treat this as an empty result for the sub-query.
    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    /// Any other non-2xx status. 5xx is retriable, 4xx is not.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// `true` for errors a collector treats as "nothing there" rather than a
    /// failure (unknown tag, removed community).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
