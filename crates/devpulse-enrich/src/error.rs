use thiserror::Error;

/// Errors surfaced by the generative-text client.
///
/// The enrichment engine catches every variant: transient errors are retried,
/// [`EnrichError::QuotaExceeded`] trips the circuit breaker for the rest of
/// the run, and anything unrecoverable routes the item to the fallback
/// scorer. None of these propagate past the engine.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429 from the service; retried with back-off.
    #[error("generative-text service rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP 5xx from the service; transient, retried with back-off.
    #[error("generative-text service unavailable: {0}")]
    Unavailable(String),

    /// The service reported its quota is exhausted. Not retried.
    #[error("generative-text quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Application-level error from the service (unexpected status or shape).
    #[error("generative-text API error: {0}")]
    Api(String),
}

impl EnrichError {
    /// `true` for errors worth retrying after a back-off delay.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EnrichError::Http(_) | EnrichError::RateLimited { .. } | EnrichError::Unavailable(_)
        )
    }
}
