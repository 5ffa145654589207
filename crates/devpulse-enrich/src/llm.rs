//! Generative-text service client.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::error::EnrichError;

/// Seam between the enrichment engine and the generative-text service.
///
/// Production uses [`LlmClient`]; tests supply scripted implementations.
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, EnrichError>> + Send;
}

/// Chat-completions response envelope.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// HTTP client for an OpenAI-style chat-completions endpoint.
///
/// Constructed once at process start and injected into the engine; there are
/// no import-time singletons. Requests pin `temperature` to 0 so repeated
/// analysis of the same content is as stable as the service allows.
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    /// Creates a client for the given chat-completions `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            api_key: api_key.map(str::to_owned),
            model: model.to_owned(),
        })
    }

    async fn generate_inner(&self, prompt: &str) -> Result<String, EnrichError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            let text = response.text().await.unwrap_or_default();
            // Providers signal exhausted quota on 429 with a distinct error
            // code; that must not be retried.
            if text.contains("insufficient_quota") {
                return Err(EnrichError::QuotaExceeded(truncate(&text, 200)));
            }
            return Err(EnrichError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            let text = response.text().await.unwrap_or_default();
            return Err(EnrichError::QuotaExceeded(truncate(&text, 200)));
        }

        if status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnrichError::Unavailable(format!(
                "status {}: {}",
                status.as_u16(),
                truncate(&text, 200)
            )));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnrichError::Api(format!(
                "status {}: {}",
                status.as_u16(),
                truncate(&text, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Api(format!("response parse error: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EnrichError::Api("response carried no choices".to_owned()))
    }
}

impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, EnrichError> {
        self.generate_inner(prompt).await
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
