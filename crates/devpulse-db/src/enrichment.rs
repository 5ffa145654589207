//! Database operations for the `enrichment_results` table.
//!
//! Results are append-only: re-analysis inserts a new row, and readers take
//! the latest row per item by `analyzed_at`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;

use devpulse_core::EnrichmentResult;

use crate::DbError;

/// A row from the `enrichment_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrichmentRow {
    pub id: i64,
    pub feedback_id: i64,
    pub sentiment_score: Decimal,
    pub sentiment_label: String,
    pub confidence: Decimal,
    pub intent: String,
    pub pain_points: Value,
    pub feature_requests: Value,
    pub competitor_mentions: Value,
    pub priority_score: i16,
    pub source: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Insert a new enrichment result for a stored item and return its id.
///
/// Scores are bound as [`Decimal`] against the `NUMERIC(4,3)` columns,
/// rounded to the column scale so a re-run with identical inputs writes an
/// identical row.
///
/// # Errors
///
/// Returns [`DbError::Serialize`] if a sub-record list cannot be serialized,
/// or [`DbError::Sqlx`] if the insert fails.
pub async fn insert_enrichment_result(
    pool: &PgPool,
    feedback_id: i64,
    result: &EnrichmentResult,
) -> Result<i64, DbError> {
    let sentiment_score = decimal_score(result.sentiment_score);
    let confidence = decimal_score(result.confidence);
    let pain_points = serde_json::to_value(&result.pain_points)?;
    let feature_requests = serde_json::to_value(&result.feature_requests)?;
    let competitor_mentions = serde_json::to_value(&result.competitor_mentions)?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO enrichment_results \
             (feedback_id, sentiment_score, sentiment_label, confidence, intent, \
              pain_points, feature_requests, competitor_mentions, priority_score, source) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(feedback_id)
    .bind(sentiment_score)
    .bind(result.sentiment_label.as_str())
    .bind(confidence)
    .bind(result.intent.as_str())
    .bind(pain_points)
    .bind(feature_requests)
    .bind(competitor_mentions)
    .bind(i16::from(result.priority_score))
    .bind(result.source.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Latest enrichment result for one item, or `None` if it was never analyzed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_enrichment(
    pool: &PgPool,
    feedback_id: i64,
) -> Result<Option<EnrichmentRow>, DbError> {
    let row = sqlx::query_as::<_, EnrichmentRow>(
        "SELECT id, feedback_id, sentiment_score, sentiment_label, confidence, intent, \
                pain_points, feature_requests, competitor_mentions, priority_score, source, \
                analyzed_at \
         FROM enrichment_results \
         WHERE feedback_id = $1 \
         ORDER BY analyzed_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(feedback_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Convert a clamped `f32` score to the `NUMERIC(4,3)` column scale.
fn decimal_score(score: f32) -> Decimal {
    Decimal::from_f32_retain(score)
        .unwrap_or_default()
        .round_dp(3)
}
