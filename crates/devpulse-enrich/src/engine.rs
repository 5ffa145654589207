//! Enrichment engine: LLM-first with a deterministic fallback path.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use devpulse_core::{EnrichmentResult, FeedbackItem};

use crate::error::EnrichError;
use crate::fallback::fallback_enrichment;
use crate::llm::TextGenerator;
use crate::prompt::build_prompt;
use crate::validate::parse_llm_reply;

/// Engine tuning knobs, taken from `AppConfig` at wiring time.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Circuit-breaker ceiling: LLM calls allowed per run. `0` disables the
    /// LLM entirely (every item takes the fallback path).
    pub max_llm_calls: u32,
    /// Additional attempts after the first failed call.
    pub max_retries: u32,
    /// Linear back-off base: the n-th retry sleeps `retry_base_ms × n`.
    pub retry_base_ms: u64,
    /// Items per batch; batches are processed strictly one after another.
    pub batch_size: usize,
    /// Pause between successive batches.
    pub batch_delay_ms: u64,
    /// Concurrent in-flight LLM calls within one batch.
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_llm_calls: 200,
            max_retries: 3,
            retry_base_ms: 1_000,
            batch_size: 5,
            batch_delay_ms: 1_500,
            concurrency: 2,
        }
    }
}

/// Attaches AI-derived signals to feedback items.
///
/// `enrich` is infallible: every item yields an [`EnrichmentResult`], tagged
/// with the code path that produced it. The engine tracks LLM usage for the
/// current run; once the configured ceiling is exceeded — or the service
/// reports exhausted quota — all remaining items short-circuit to the
/// fallback scorer.
pub struct EnrichmentEngine<G: TextGenerator> {
    generator: G,
    config: EngineConfig,
    /// LLM calls attempted this run. Atomic: enrichment may run lightly
    /// parallel within a batch.
    llm_calls: AtomicU32,
    quota_exhausted: AtomicBool,
}

impl<G: TextGenerator> EnrichmentEngine<G> {
    pub fn new(generator: G, config: EngineConfig) -> Self {
        Self {
            generator,
            config,
            llm_calls: AtomicU32::new(0),
            quota_exhausted: AtomicBool::new(false),
        }
    }

    /// Number of LLM calls attempted so far in this run.
    pub fn llm_calls_used(&self) -> u32 {
        self.llm_calls.load(Ordering::SeqCst)
    }

    /// Enrich one item. Never fails; the result's `source` records whether
    /// the LLM reply was used or the fallback scorer ran.
    pub async fn enrich(&self, item: &FeedbackItem) -> EnrichmentResult {
        if !self.reserve_llm_call() {
            tracing::debug!(url = %item.url, "circuit breaker open — using fallback scorer");
            return fallback_enrichment(&item.content);
        }

        match self.generate_validated(item).await {
            Ok(result) => result,
            Err(reason) => {
                tracing::warn!(url = %item.url, reason = %reason, "LLM path failed — using fallback scorer");
                fallback_enrichment(&item.content)
            }
        }
    }

    /// Enrich a set of `(feedback_id, item)` pairs in paced batches.
    ///
    /// Batches run strictly in sequence with `batch_delay_ms` between them;
    /// within a batch at most `concurrency` calls are in flight — the
    /// generative-text service is the one shared resource, so it is never hit
    /// fully parallel.
    pub async fn enrich_batch(
        &self,
        items: Vec<(i64, FeedbackItem)>,
    ) -> Vec<(i64, EnrichmentResult)> {
        let mut results = Vec::with_capacity(items.len());
        let batch_size = self.config.batch_size.max(1);
        let concurrency = self.config.concurrency.max(1);
        let batch_count = items.len().div_ceil(batch_size);

        for (index, batch) in items.chunks(batch_size).enumerate() {
            let batch_results: Vec<(i64, EnrichmentResult)> = stream::iter(batch)
                .map(|(id, item)| async move { (*id, self.enrich(item).await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;
            results.extend(batch_results);

            if index + 1 < batch_count && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
        }

        results
    }

    /// Claim one LLM call slot. Returns `false` once the per-run ceiling is
    /// reached or quota was reported exhausted.
    fn reserve_llm_call(&self) -> bool {
        if self.quota_exhausted.load(Ordering::SeqCst) {
            return false;
        }
        // Compare-exchange loop so the ceiling holds under concurrent
        // callers and the counter never drifts past it.
        let mut current = self.llm_calls.load(Ordering::SeqCst);
        loop {
            if current >= self.config.max_llm_calls {
                return false;
            }
            match self.llm_calls.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    async fn generate_validated(&self, item: &FeedbackItem) -> Result<EnrichmentResult, String> {
        let prompt = build_prompt(item);

        let mut attempt = 0u32;
        let reply = loop {
            match self.generator.generate(&prompt).await {
                Ok(reply) => break reply,
                Err(EnrichError::QuotaExceeded(message)) => {
                    self.quota_exhausted.store(true, Ordering::SeqCst);
                    return Err(format!("quota exceeded: {message}"));
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay_ms = self.config.retry_base_ms.saturating_mul(u64::from(attempt));
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms,
                        error = %e,
                        "transient generate error — retrying after back-off"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e.to_string()),
            }
        };

        // Unusable output is not retried: the model already had its chance.
        parse_llm_reply(&reply).map_err(|reason| format!("reply rejected: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::Utc;
    use devpulse_core::{EnrichmentSource, Platform, SentimentLabel};

    /// Scripted generator: pops pre-programmed outcomes in order, counting
    /// calls. An exhausted script keeps returning the last-resort API error.
    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, EnrichError>>>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<String, EnrichError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, EnrichError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("script mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(EnrichError::Api("script exhausted".to_owned())))
        }
    }

    fn item(content: &str) -> FeedbackItem {
        FeedbackItem {
            platform: Platform::Forum,
            content: content.to_string(),
            author: "alice".to_string(),
            url: "https://forum.example.com/t/1".to_string(),
            posted_at: Utc::now(),
            metadata: serde_json::json!({}),
        }
    }

    fn good_reply(score: f64) -> String {
        serde_json::json!({
            "sentiment_score": score,
            "sentiment_label": if score < 0.0 { "negative" } else { "positive" },
            "confidence": 0.9,
            "intent": "discussion",
            "pain_points": [],
            "feature_requests": [],
            "competitor_mentions": []
        })
        .to_string()
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            retry_base_ms: 0,
            batch_delay_ms: 0,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn valid_reply_produces_llm_result() {
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(vec![Ok(good_reply(-0.8))]),
            fast_config(),
        );
        let result = engine.enrich(&item("the app crashes")).await;
        assert_eq!(result.source, EnrichmentSource::Llm);
        assert_eq!(result.sentiment_label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_without_panicking() {
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(vec![Ok("{\"sentiment_sco".to_owned())]),
            fast_config(),
        );
        let result = engine.enrich(&item("this is a terrible bug")).await;
        assert_eq!(result.source, EnrichmentSource::FallbackHeuristic);
        assert!(result.sentiment_score < 0.0);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_then_succeed() {
        let generator = ScriptedGenerator::new(vec![
            Err(EnrichError::RateLimited {
                retry_after_secs: 0,
            }),
            Err(EnrichError::RateLimited {
                retry_after_secs: 0,
            }),
            Ok(good_reply(0.5)),
        ]);
        let engine = EnrichmentEngine::new(generator, fast_config());
        let result = engine.enrich(&item("pretty good")).await;
        assert_eq!(result.source, EnrichmentSource::Llm);
        assert_eq!(engine.generator.calls(), 3);
    }

    #[tokio::test]
    async fn api_error_is_not_retried() {
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(vec![Err(EnrichError::Api("bad request".to_owned()))]),
            fast_config(),
        );
        let result = engine.enrich(&item("whatever")).await;
        assert_eq!(result.source, EnrichmentSource::FallbackHeuristic);
        assert_eq!(engine.generator.calls(), 1);
    }

    #[tokio::test]
    async fn breaker_ceiling_routes_later_items_to_fallback() {
        // Ceiling 5: items 1-5 go to the LLM, item 6+ must not.
        let script: Vec<Result<String, EnrichError>> =
            (0..5).map(|_| Ok(good_reply(0.3))).collect();
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(script),
            EngineConfig {
                max_llm_calls: 5,
                ..fast_config()
            },
        );

        let mut sources = Vec::new();
        for i in 0..7 {
            let result = engine.enrich(&item(&format!("item number {i}"))).await;
            sources.push(result.source);
        }

        assert!(sources[..5]
            .iter()
            .all(|s| *s == EnrichmentSource::Llm));
        assert!(sources[5..]
            .iter()
            .all(|s| *s == EnrichmentSource::FallbackHeuristic));
        assert_eq!(engine.generator.calls(), 5, "6th call must never reach the service");
    }

    #[tokio::test]
    async fn quota_exhaustion_trips_breaker_for_rest_of_run() {
        let generator = ScriptedGenerator::new(vec![
            Ok(good_reply(0.4)),
            Err(EnrichError::QuotaExceeded("insufficient_quota".to_owned())),
        ]);
        let engine = EnrichmentEngine::new(generator, fast_config());

        let first = engine.enrich(&item("one")).await;
        let second = engine.enrich(&item("two")).await;
        let third = engine.enrich(&item("three")).await;

        assert_eq!(first.source, EnrichmentSource::Llm);
        assert_eq!(second.source, EnrichmentSource::FallbackHeuristic);
        assert_eq!(third.source, EnrichmentSource::FallbackHeuristic);
        assert_eq!(
            engine.generator.calls(),
            2,
            "after quota trips, no further calls reach the service"
        );
    }

    #[tokio::test]
    async fn zero_ceiling_disables_llm_entirely() {
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(vec![Ok(good_reply(0.4))]),
            EngineConfig {
                max_llm_calls: 0,
                ..fast_config()
            },
        );
        let result = engine.enrich(&item("anything")).await;
        assert_eq!(result.source, EnrichmentSource::FallbackHeuristic);
        assert_eq!(engine.generator.calls(), 0);
    }

    #[tokio::test]
    async fn enrich_batch_returns_result_for_every_item() {
        let script: Vec<Result<String, EnrichError>> =
            (0..4).map(|_| Ok(good_reply(0.2))).collect();
        let engine = EnrichmentEngine::new(
            ScriptedGenerator::new(script),
            EngineConfig {
                batch_size: 2,
                concurrency: 2,
                ..fast_config()
            },
        );

        let items: Vec<(i64, FeedbackItem)> = (0..4)
            .map(|i| (i64::from(i), item(&format!("content {i}"))))
            .collect();
        let results = engine.enrich_batch(items).await;

        assert_eq!(results.len(), 4);
        let mut ids: Vec<i64> = results.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
