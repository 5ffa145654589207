//! Database operations for the `daily_aggregates` table.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `daily_aggregates` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DailyAggregateRow {
    pub id: i64,
    pub date: NaiveDate,
    pub total_feedback: i32,
    pub average_sentiment: Option<Decimal>,
    pub active_platforms: i32,
    pub critical_issues: i32,
    pub last_updated: DateTime<Utc>,
}

/// Computed metrics for one UTC calendar day, ready to upsert.
///
/// Produced by the aggregator's pure computation; `last_updated` is set by
/// the database so the metric fields alone decide row equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub total_feedback: i32,
    /// `None` when no item of the day has an enrichment result.
    pub average_sentiment: Option<Decimal>,
    pub active_platforms: i32,
    pub critical_issues: i32,
}

/// One feedback item of a day joined to its latest enrichment result (if
/// any), the aggregator's input shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DayItemRow {
    pub platform: String,
    pub posted_at: DateTime<Utc>,
    pub sentiment_score: Option<Decimal>,
    pub sentiment_label: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Items whose `posted_at` falls in the UTC calendar day, each joined to its
/// latest enrichment result. Items without a result carry `NULL` sentiment
/// columns (excluded from averages, never treated as zero).
///
/// Day bounds are computed in Rust and bound as timestamptz so the window is
/// UTC regardless of the server's `TimeZone` setting.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_day_rows(pool: &PgPool, date: NaiveDate) -> Result<Vec<DayItemRow>, DbError> {
    let day_start = DateTime::<Utc>::from_naive_utc_and_offset(
        date.and_time(chrono::NaiveTime::MIN),
        Utc,
    );
    let day_end = day_start + chrono::Duration::days(1);

    let rows = sqlx::query_as::<_, DayItemRow>(
        "SELECT f.platform, f.posted_at, e.sentiment_score, e.sentiment_label \
         FROM feedback_items f \
         LEFT JOIN LATERAL ( \
             SELECT sentiment_score, sentiment_label \
             FROM enrichment_results \
             WHERE feedback_id = f.id \
             ORDER BY analyzed_at DESC, id DESC \
             LIMIT 1 \
         ) e ON TRUE \
         WHERE f.posted_at >= $1 AND f.posted_at < $2 \
         ORDER BY f.posted_at ASC, f.id ASC",
    )
    .bind(day_start)
    .bind(day_end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert or update the rollup row for `date`.
///
/// Conflicts on `date` overwrite every metric column and refresh
/// `last_updated`, so repeated invocation for the same date is idempotent in
/// the metric columns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_daily_aggregate(
    pool: &PgPool,
    metrics: &DailyMetrics,
) -> Result<DailyAggregateRow, DbError> {
    let row = sqlx::query_as::<_, DailyAggregateRow>(
        "INSERT INTO daily_aggregates \
             (date, total_feedback, average_sentiment, active_platforms, critical_issues) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (date) DO UPDATE SET \
             total_feedback    = EXCLUDED.total_feedback, \
             average_sentiment = EXCLUDED.average_sentiment, \
             active_platforms  = EXCLUDED.active_platforms, \
             critical_issues   = EXCLUDED.critical_issues, \
             last_updated      = NOW() \
         RETURNING id, date, total_feedback, average_sentiment, active_platforms, \
                   critical_issues, last_updated",
    )
    .bind(metrics.date)
    .bind(metrics.total_feedback)
    .bind(metrics.average_sentiment)
    .bind(metrics.active_platforms)
    .bind(metrics.critical_issues)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch the rollup row for `date`, or `None` if it was never computed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_daily_aggregate(
    pool: &PgPool,
    date: NaiveDate,
) -> Result<Option<DailyAggregateRow>, DbError> {
    let row = sqlx::query_as::<_, DailyAggregateRow>(
        "SELECT id, date, total_feedback, average_sentiment, active_platforms, \
                critical_issues, last_updated \
         FROM daily_aggregates \
         WHERE date = $1",
    )
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
