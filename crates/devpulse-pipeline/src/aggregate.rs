//! Daily aggregation: rollup metrics recomputed per UTC calendar day.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use devpulse_db::{
    fetch_day_rows, upsert_daily_aggregate, DailyAggregateRow, DailyMetrics, DayItemRow, DbError,
};

/// Compute the rollup metrics for `date` from the day's joined rows.
///
/// Pure function of its inputs, so recomputation over unchanged data yields
/// an identical [`DailyMetrics`]:
/// - `total_feedback` — count of the day's items.
/// - `average_sentiment` — mean `sentiment_score` over items that have an
///   enrichment result; items without one are excluded, not treated as zero.
///   `None` when nothing was enriched.
/// - `active_platforms` — distinct platforms in the trailing 24 h of the day
///   (the input rows are bounded to the calendar day, so that is the day's
///   distinct platform count).
/// - `critical_issues` — items whose label is `negative`.
#[must_use]
pub fn compute_daily_metrics(date: NaiveDate, rows: &[DayItemRow]) -> DailyMetrics {
    let scores: Vec<Decimal> = rows.iter().filter_map(|r| r.sentiment_score).collect();

    let average_sentiment = if scores.is_empty() {
        None
    } else {
        let sum: Decimal = scores.iter().copied().sum();
        Some((sum / Decimal::from(scores.len())).round_dp(3))
    };

    let active_platforms = rows
        .iter()
        .map(|r| r.platform.as_str())
        .collect::<HashSet<_>>()
        .len();

    let critical_issues = rows
        .iter()
        .filter(|r| r.sentiment_label.as_deref() == Some("negative"))
        .count();

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    DailyMetrics {
        date,
        total_feedback: rows.len() as i32,
        average_sentiment,
        active_platforms: active_platforms as i32,
        critical_issues: critical_issues as i32,
    }
}

/// Recompute and upsert the rollup row for `date`.
///
/// Reads the day's items joined to their latest enrichment results, computes
/// the metrics, and writes via upsert keyed by `date` — repeated invocation
/// with no new data rewrites the same metric values.
///
/// # Errors
///
/// Returns [`DbError`] if the read or the upsert fails.
pub async fn recompute_daily(pool: &PgPool, date: NaiveDate) -> Result<DailyAggregateRow, DbError> {
    let rows = fetch_day_rows(pool, date).await?;
    let metrics = compute_daily_metrics(date, &rows);

    tracing::debug!(
        date = %date,
        total_feedback = metrics.total_feedback,
        critical_issues = metrics.critical_issues,
        active_platforms = metrics.active_platforms,
        "recomputed daily aggregate"
    );

    upsert_daily_aggregate(pool, &metrics).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
    }

    fn row(platform: &str, score: Option<&str>, label: Option<&str>) -> DayItemRow {
        DayItemRow {
            platform: platform.to_string(),
            posted_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            sentiment_score: score.map(|s| s.parse().expect("valid decimal")),
            sentiment_label: label.map(str::to_string),
        }
    }

    #[test]
    fn empty_day_produces_zero_row_with_null_average() {
        let metrics = compute_daily_metrics(date(), &[]);
        assert_eq!(metrics.total_feedback, 0);
        assert_eq!(metrics.average_sentiment, None);
        assert_eq!(metrics.active_platforms, 0);
        assert_eq!(metrics.critical_issues, 0);
    }

    #[test]
    fn unenriched_items_are_excluded_from_average_not_zeroed() {
        let rows = vec![
            row("forum", Some("0.500"), Some("positive")),
            row("forum", None, None),
            row("forum", None, None),
        ];
        let metrics = compute_daily_metrics(date(), &rows);
        assert_eq!(metrics.total_feedback, 3);
        // Mean over the single enriched item, not over all three.
        assert_eq!(metrics.average_sentiment, Some("0.500".parse().unwrap()));
    }

    #[test]
    fn critical_issues_use_the_label_definition() {
        let rows = vec![
            row("forum", Some("-0.900"), Some("negative")),
            row("social", Some("-0.050"), Some("neutral")),
            row("social", Some("-0.800"), Some("negative")),
            row("articles", Some("0.700"), Some("positive")),
        ];
        let metrics = compute_daily_metrics(date(), &rows);
        assert_eq!(metrics.critical_issues, 2);
        assert_eq!(metrics.active_platforms, 3);
    }

    #[test]
    fn recompute_is_idempotent_over_identical_rows() {
        // Scenario: ten items, same inputs twice — identical metrics out.
        let rows: Vec<DayItemRow> = (0..10)
            .map(|i| {
                let score = if i % 2 == 0 { "0.400" } else { "-0.600" };
                let label = if i % 2 == 0 { "positive" } else { "negative" };
                row(
                    if i < 5 { "forum" } else { "technews" },
                    Some(score),
                    Some(label),
                )
            })
            .collect();

        let first = compute_daily_metrics(date(), &rows);
        let second = compute_daily_metrics(date(), &rows);
        assert_eq!(first, second);
        assert_eq!(first.total_feedback, 10);
        assert_eq!(first.average_sentiment, Some("-0.100".parse().unwrap()));
        assert_eq!(first.critical_issues, 5);
        assert_eq!(first.active_platforms, 2);
    }

    #[test]
    fn average_rounds_to_storage_scale() {
        let rows = vec![
            row("forum", Some("0.100"), Some("neutral")),
            row("forum", Some("0.200"), Some("neutral")),
            row("forum", Some("0.200"), Some("neutral")),
        ];
        let metrics = compute_daily_metrics(date(), &rows);
        // (0.1 + 0.2 + 0.2) / 3 = 0.1666… → 0.167 at NUMERIC(4,3) scale.
        assert_eq!(metrics.average_sentiment, Some("0.167".parse().unwrap()));
    }
}
