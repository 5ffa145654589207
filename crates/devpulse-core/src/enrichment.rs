//! Enrichment result types, attached 1:1 to stored feedback items.
//!
//! Lives in core so the enrichment engine, the storage layer, and the
//! pipeline all speak the same structures.

use serde::{Deserialize, Serialize};

/// Overall sentiment classification of one feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Mixed => "mixed",
        }
    }

    /// Parse a label, substituting the documented default (`Neutral`) for any
    /// unrecognized value. Invalid enum values are never propagated.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            "mixed" => SentimentLabel::Mixed,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// What the author is trying to do with the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BugReport,
    FeatureRequest,
    Question,
    Praise,
    Complaint,
    Discussion,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::BugReport => "bug_report",
            Intent::FeatureRequest => "feature_request",
            Intent::Question => "question",
            Intent::Praise => "praise",
            Intent::Complaint => "complaint",
            Intent::Discussion => "discussion",
        }
    }

    /// Parse an intent, substituting the documented default (`Discussion`)
    /// for any unrecognized value.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bug_report" => Intent::BugReport,
            "feature_request" => Intent::FeatureRequest,
            "question" => Intent::Question,
            "praise" => Intent::Praise,
            "complaint" => Intent::Complaint,
            _ => Intent::Discussion,
        }
    }
}

/// Which code path produced an enrichment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    Llm,
    FallbackHeuristic,
}

impl EnrichmentSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrichmentSource::Llm => "llm",
            EnrichmentSource::FallbackHeuristic => "fallback_heuristic",
        }
    }
}

/// A concrete problem the author is hitting, with a 1–10 severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PainPoint {
    pub description: String,
    pub severity: u8,
    pub category: Option<String>,
}

/// A capability the author is asking for, with a 1–10 severity (urgency).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRequest {
    pub description: String,
    pub severity: u8,
}

/// A competing product mentioned in the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorMention {
    pub name: String,
    pub context: Option<String>,
}

/// AI-derived structured signals for one stored feedback item.
///
/// Created once per item and never mutated; re-analysis inserts a new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Overall sentiment in `[-1.0, 1.0]`.
    pub sentiment_score: f32,
    pub sentiment_label: SentimentLabel,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    pub intent: Intent,
    pub pain_points: Vec<PainPoint>,
    pub feature_requests: Vec<FeatureRequest>,
    pub competitor_mentions: Vec<CompetitorMention>,
    /// Max severity across pain points and feature requests, floored at 5.
    pub priority_score: u8,
    pub source: EnrichmentSource,
}

/// Derive the priority score: max severity across pain points and feature
/// requests, floored at 5 and capped at 10.
#[must_use]
pub fn priority_from(pain_points: &[PainPoint], feature_requests: &[FeatureRequest]) -> u8 {
    let max_severity = pain_points
        .iter()
        .map(|p| p.severity)
        .chain(feature_requests.iter().map(|f| f.severity))
        .max()
        .unwrap_or(0);
    max_severity.clamp(5, 10)
}
