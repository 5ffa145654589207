//! Strict validation of generative-text replies.
//!
//! A reply is only accepted when it parses as JSON and carries every required
//! field. Accepted replies are normalized: numeric fields are clamped to
//! their valid ranges and enum fields fall back to documented defaults, so an
//! out-of-range or unrecognized value never reaches storage.

use serde::Deserialize;

use devpulse_core::{
    priority_from, CompetitorMention, EnrichmentResult, EnrichmentSource, FeatureRequest, Intent,
    PainPoint, SentimentLabel,
};

/// Raw reply shape. Everything is optional at the parse stage; requiredness
/// is enforced in [`parse_llm_reply`] so one missing field produces a clear
/// rejection instead of a serde error buried in a type mismatch.
#[derive(Debug, Deserialize)]
struct RawReply {
    sentiment_score: Option<f64>,
    sentiment_label: Option<String>,
    confidence: Option<f64>,
    intent: Option<String>,
    #[serde(default)]
    pain_points: Vec<RawPainPoint>,
    #[serde(default)]
    feature_requests: Vec<RawFeatureRequest>,
    #[serde(default)]
    competitor_mentions: Vec<RawCompetitorMention>,
}

#[derive(Debug, Deserialize)]
struct RawPainPoint {
    description: Option<String>,
    severity: Option<i64>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeatureRequest {
    description: Option<String>,
    severity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCompetitorMention {
    name: Option<String>,
    context: Option<String>,
}

/// Parse and normalize a reply into an [`EnrichmentResult`] tagged
/// `source = Llm`.
///
/// # Errors
///
/// Returns a human-readable rejection reason when the reply is not JSON, has
/// no object payload, or is missing a required field. The caller discards the
/// reply and falls through to the fallback scorer.
pub(crate) fn parse_llm_reply(raw: &str) -> Result<EnrichmentResult, String> {
    let payload = extract_json_object(raw).ok_or("reply contains no JSON object")?;

    let reply: RawReply =
        serde_json::from_str(payload).map_err(|e| format!("reply is not valid JSON: {e}"))?;

    let sentiment_score = reply
        .sentiment_score
        .ok_or("missing required field sentiment_score")?;
    let sentiment_label = reply
        .sentiment_label
        .ok_or("missing required field sentiment_label")?;
    let confidence = reply.confidence.ok_or("missing required field confidence")?;

    let pain_points: Vec<PainPoint> = reply
        .pain_points
        .into_iter()
        .filter_map(|p| {
            Some(PainPoint {
                description: non_empty(p.description)?,
                severity: clamp_severity(p.severity),
                category: p.category.and_then(|c| non_empty(Some(c))),
            })
        })
        .collect();

    let feature_requests: Vec<FeatureRequest> = reply
        .feature_requests
        .into_iter()
        .filter_map(|f| {
            Some(FeatureRequest {
                description: non_empty(f.description)?,
                severity: clamp_severity(f.severity),
            })
        })
        .collect();

    let competitor_mentions: Vec<CompetitorMention> = reply
        .competitor_mentions
        .into_iter()
        .filter_map(|c| {
            Some(CompetitorMention {
                name: non_empty(c.name)?,
                context: c.context.and_then(|ctx| non_empty(Some(ctx))),
            })
        })
        .collect();

    let priority_score = priority_from(&pain_points, &feature_requests);

    #[allow(clippy::cast_possible_truncation)]
    Ok(EnrichmentResult {
        sentiment_score: sentiment_score.clamp(-1.0, 1.0) as f32,
        sentiment_label: SentimentLabel::parse_or_default(&sentiment_label),
        confidence: confidence.clamp(0.0, 1.0) as f32,
        intent: Intent::parse_or_default(reply.intent.as_deref().unwrap_or_default()),
        pain_points,
        feature_requests,
        competitor_mentions,
        priority_score,
        source: EnrichmentSource::Llm,
    })
}

/// Slice out the outermost `{ … }` so replies wrapped in markdown fences or
/// prose still parse.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn clamp_severity(severity: Option<i64>) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        severity.unwrap_or(5).clamp(1, 10) as u8
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
