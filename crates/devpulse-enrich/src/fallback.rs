//! Deterministic keyword-based fallback scorer.
//!
//! Used when the generative-text service is unavailable, over quota, or
//! returns unusable output. The score is a pure function of the content —
//! identical text always yields identical results, independent of call order
//! or prior state — so the whole path is testable without network access.

use regex::Regex;

use devpulse_core::{EnrichmentResult, EnrichmentSource, Intent, SentimentLabel};

/// Positive sentiment markers, matched case-insensitively on word boundaries.
const POSITIVE_TERMS: &[&str] = &[
    "amazing",
    "awesome",
    "excellent",
    "fantastic",
    "great",
    "love",
    "loved",
    "loving",
    "perfect",
    "wonderful",
    "fast",
    "faster",
    "reliable",
    "solid",
    "smooth",
    "helpful",
    "intuitive",
    "impressed",
    "recommend",
    "recommended",
    "works",
    "thanks",
    "thank",
    "best",
    "good",
];

/// Negative sentiment markers, matched case-insensitively on word boundaries.
const NEGATIVE_TERMS: &[&str] = &[
    "awful",
    "bad",
    "broken",
    "breaks",
    "bug",
    "buggy",
    "bugs",
    "crash",
    "crashes",
    "crashed",
    "confusing",
    "disappointed",
    "disappointing",
    "error",
    "errors",
    "fails",
    "failed",
    "failure",
    "frustrating",
    "hate",
    "horrible",
    "issue",
    "issues",
    "problem",
    "problems",
    "regression",
    "slow",
    "slower",
    "terrible",
    "unusable",
    "useless",
    "worst",
    "worse",
];

/// Markers that flag the content as a bug report when sentiment is negative.
const BUG_MARKERS: &[&str] = &["bug", "bugs", "crash", "crashes", "crashed", "broken", "error", "errors", "regression"];

/// Markers that flag the content as a feature request.
const FEATURE_MARKERS: &[&str] = &["feature", "request", "wish", "support", "add"];

const NEUTRAL_BAND: f32 = 0.1;
const MAX_FALLBACK_CONFIDENCE: f32 = 0.8;

/// Score `content` with the keyword tables.
///
/// `sentiment_score = (positive − negative) / max(positive + negative, 1)`,
/// scaled into `[-1.0, 1.0]`. The label comes from a ±0.1 neutral band, with
/// `Mixed` when both polarities matched but neither dominates. Confidence
/// starts at 0.2 (nothing matched) and grows with match count, capped at 0.8.
/// Pain-point/feature lists stay empty, so `priority_score` sits at its
/// floor of 5.
#[must_use]
pub fn fallback_enrichment(content: &str) -> EnrichmentResult {
    let tokens = tokenize(content);

    let positive = tokens
        .iter()
        .filter(|t| POSITIVE_TERMS.contains(&t.as_str()))
        .count();
    let negative = tokens
        .iter()
        .filter(|t| NEGATIVE_TERMS.contains(&t.as_str()))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let score = (positive as f32 - negative as f32) / (positive + negative).max(1) as f32;
    let score = score.clamp(-1.0, 1.0);

    let sentiment_label = if score > NEUTRAL_BAND {
        SentimentLabel::Positive
    } else if score < -NEUTRAL_BAND {
        SentimentLabel::Negative
    } else if positive > 0 && negative > 0 {
        SentimentLabel::Mixed
    } else {
        SentimentLabel::Neutral
    };

    let matched = positive + negative;
    #[allow(clippy::cast_precision_loss)]
    let confidence = if matched == 0 {
        0.2
    } else {
        (0.3 + 0.05 * matched as f32).min(MAX_FALLBACK_CONFIDENCE)
    };

    let intent = classify_intent(&tokens, sentiment_label);

    EnrichmentResult {
        sentiment_score: score,
        sentiment_label,
        confidence,
        intent,
        pain_points: Vec::new(),
        feature_requests: Vec::new(),
        competitor_mentions: Vec::new(),
        priority_score: 5,
        source: EnrichmentSource::FallbackHeuristic,
    }
}

fn classify_intent(tokens: &[String], label: SentimentLabel) -> Intent {
    let has = |markers: &[&str]| tokens.iter().any(|t| markers.contains(&t.as_str()));
    if label == SentimentLabel::Negative && has(BUG_MARKERS) {
        Intent::BugReport
    } else if has(FEATURE_MARKERS) {
        Intent::FeatureRequest
    } else {
        Intent::Discussion
    }
}

/// Lowercased word tokens; punctuation acts as a boundary, apostrophes stay
/// inside words.
fn tokenize(content: &str) -> Vec<String> {
    let word = Regex::new(r"[a-z0-9']+").expect("valid word regex");
    let lowered = content.to_lowercase();
    word.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
