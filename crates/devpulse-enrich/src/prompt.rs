//! Prompt construction for the generative-text service.

use devpulse_core::FeedbackItem;

/// Longest content slice embedded in a prompt. Anything beyond this adds cost
/// without changing the extracted signals.
const CONTENT_BUDGET_CHARS: usize = 4_000;

/// Render the enrichment prompt for one feedback item.
///
/// The instruction block pins the reply to a single JSON object with a fixed
/// schema; the engine rejects anything that does not conform.
#[must_use]
pub fn build_prompt(item: &FeedbackItem) -> String {
    let content: String = item.content.chars().take(CONTENT_BUDGET_CHARS).collect();
    format!(
        r#"You are analyzing developer feedback collected from the "{platform}" platform.

Analyze the feedback below and respond with a single JSON object — no prose,
no markdown fences — conforming exactly to this schema:

{{
  "sentiment_score": <number between -1.0 and 1.0>,
  "sentiment_label": "positive" | "negative" | "neutral" | "mixed",
  "confidence": <number between 0.0 and 1.0>,
  "intent": "bug_report" | "feature_request" | "question" | "praise" | "complaint" | "discussion",
  "pain_points": [{{"description": <string>, "severity": <integer 1-10>, "category": <string or null>}}],
  "feature_requests": [{{"description": <string>, "severity": <integer 1-10>}}],
  "competitor_mentions": [{{"name": <string>, "context": <string or null>}}]
}}

Use empty arrays when nothing applies. Severity reflects how strongly the
author is affected.

Feedback:
{content}"#,
        platform = item.platform,
    )
}
