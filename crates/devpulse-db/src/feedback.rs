//! Database operations for the `feedback_items` table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use devpulse_core::{FeedbackItem, Platform};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `feedback_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub platform: String,
    pub content: String,
    pub author: String,
    pub url: String,
    pub posted_at: DateTime<Utc>,
    pub metadata: Value,
    pub dedup_key: String,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRow {
    /// Reconstruct the canonical item from a stored row.
    ///
    /// Rows whose platform string no longer parses (schema drift) fall back
    /// to [`Platform::News`] rather than being dropped.
    #[must_use]
    pub fn to_item(&self) -> FeedbackItem {
        FeedbackItem {
            platform: Platform::parse(&self.platform).unwrap_or(Platform::News),
            content: self.content.clone(),
            author: self.author.clone(),
            url: self.url.clone(),
            posted_at: self.posted_at,
            metadata: self.metadata.clone(),
        }
    }
}

/// An item staged for insertion, paired with its precomputed dedup key.
#[derive(Debug, Clone)]
pub struct NewFeedbackItem {
    pub item: FeedbackItem,
    pub dedup_key: String,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert items, skipping any whose `dedup_key` is already stored.
///
/// Returns the generated ids of rows that were actually inserted;
/// conflict-skipped items yield no id. Items with empty content are rejected
/// by the database `CHECK` constraint, so callers filter them first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn insert_feedback_items(
    pool: &PgPool,
    items: &[NewFeedbackItem],
) -> Result<Vec<i64>, DbError> {
    let mut inserted = Vec::with_capacity(items.len());

    for staged in items {
        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO feedback_items (platform, content, author, url, posted_at, metadata, dedup_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (dedup_key) DO NOTHING \
             RETURNING id",
        )
        .bind(staged.item.platform.as_str())
        .bind(&staged.item.content)
        .bind(&staged.item.author)
        .bind(&staged.item.url)
        .bind(staged.item.posted_at)
        .bind(&staged.item.metadata)
        .bind(&staged.dedup_key)
        .fetch_optional(pool)
        .await?;

        if let Some(id) = id {
            inserted.push(id);
        }
    }

    Ok(inserted)
}

/// Dedup keys of rows already stored for `platform` with `posted_at >= since`.
///
/// Backs the second dedup pass: the pipeline excludes collected items whose
/// key is already present before inserting.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn query_existing_keys(
    pool: &PgPool,
    platform: Platform,
    since: DateTime<Utc>,
) -> Result<HashSet<String>, DbError> {
    let keys: Vec<String> = sqlx::query_scalar(
        "SELECT dedup_key FROM feedback_items \
         WHERE platform = $1 AND posted_at >= $2",
    )
    .bind(platform.as_str())
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(keys.into_iter().collect())
}

/// Oldest stored items that have no enrichment result yet, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn query_unanalyzed(pool: &PgPool, limit: i64) -> Result<Vec<FeedbackRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT f.id, f.platform, f.content, f.author, f.url, f.posted_at, \
                f.metadata, f.dedup_key, f.created_at \
         FROM feedback_items f \
         LEFT JOIN enrichment_results e ON e.feedback_id = f.id \
         WHERE e.id IS NULL \
         ORDER BY f.id ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch stored rows by id, preserving the given id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_feedback_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<FeedbackRow>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT id, platform, content, author, url, posted_at, metadata, dedup_key, created_at \
         FROM feedback_items \
         WHERE id = ANY($1) \
         ORDER BY array_position($1, id)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
