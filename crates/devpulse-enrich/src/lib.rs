//! Enrichment engine for DevPulse.
//!
//! Sends stored feedback content to the generative-text service with a strict
//! JSON-schema prompt, validates and clamps the reply, and falls back to a
//! deterministic keyword scorer whenever the service is unavailable, over
//! quota, or returns unusable output. A per-run circuit breaker caps the
//! total number of LLM calls.

pub mod engine;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod prompt;
mod validate;

pub use engine::{EngineConfig, EnrichmentEngine};
pub use error::EnrichError;
pub use fallback::fallback_enrichment;
pub use llm::{LlmClient, TextGenerator};

// The result types live in devpulse-core so storage and the pipeline share
// them; re-exported here for callers that only deal with enrichment.
pub use devpulse_core::{
    CompetitorMention, EnrichmentResult, EnrichmentSource, FeatureRequest, Intent, PainPoint,
    SentimentLabel,
};
