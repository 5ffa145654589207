//! Tech-news collector (id-addressable item API behind a story-id listing).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use devpulse_core::{FeedbackItem, Platform, RecencyWindow, TechNewsConfig};
use devpulse_fetch::{FetchClient, Pacer};

use crate::CollectorOutput;

/// One id-addressable item: `GET {base}/v0/item/{id}.json`.
#[derive(Debug, Deserialize)]
struct Item {
    id: u64,
    title: Option<String>,
    text: Option<String>,
    by: Option<String>,
    time: Option<i64>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    kids: Vec<u64>,
    url: Option<String>,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
}

/// Collects recent stories from the tech-news item API.
///
/// Two-phase query shape: the story-id listing first, then one item fetch
/// per id (paced). Item-level failures are per-query failures — logged and
/// recorded, never fatal to the rest of the scan.
pub struct TechNewsCollector {
    client: FetchClient,
    pacer: Pacer,
    config: TechNewsConfig,
}

impl TechNewsCollector {
    #[must_use]
    pub fn new(client: FetchClient, config: TechNewsConfig) -> Self {
        let pacer = Pacer::from_millis(config.pace_ms);
        Self {
            client,
            pacer,
            config,
        }
    }

    pub async fn collect(&self, window: RecencyWindow) -> CollectorOutput {
        let mut output = CollectorOutput::default();
        let base = self.config.base_url.trim_end_matches('/');

        self.pacer.pause().await;
        let listing_url = format!("{base}/v0/newstories.json");
        let ids: Vec<u64> = match self.client.get_json(&listing_url).await {
            Ok(ids) => ids,
            Err(e) => {
                // Without the id listing there is nothing to scan.
                tracing::warn!(error = %e, "story-id listing failed");
                output.errors.push(format!("newstories: {e}"));
                return output;
            }
        };

        let scanned = ids.len().min(self.config.scan_limit);
        tracing::debug!(
            available = ids.len(),
            scanned,
            "scanning tech-news story ids"
        );

        for id in ids.into_iter().take(self.config.scan_limit) {
            self.pacer.pause().await;
            let item_url = format!("{base}/v0/item/{id}.json");

            match self.client.get_json::<Item>(&item_url).await {
                Ok(item) => {
                    if let Some(mapped) = item_to_feedback(base, &item) {
                        if window.contains(mapped.posted_at) {
                            output.items.push(mapped);
                        }
                    }
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(id, "story id not found — skipping");
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "item fetch failed");
                    output.errors.push(format!("item {id}: {e}"));
                }
            }
        }

        output
    }
}

/// Map one item to a canonical feedback item. Dead, deleted, untitled, or
/// untimestamped items are skipped.
fn item_to_feedback(base_url: &str, item: &Item) -> Option<FeedbackItem> {
    if item.dead || item.deleted {
        return None;
    }
    let title = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let posted_at = epoch_to_datetime(item.time?)?;

    let content = match item.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!("{title}\n\n{text}"),
        _ => title.to_string(),
    };

    let author = item
        .by
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown")
        .to_string();

    // Link stories point elsewhere; discussion-only stories get the
    // platform's own item page.
    let url = item
        .url
        .clone()
        .unwrap_or_else(|| format!("{base_url}/item?id={}", item.id));

    Some(FeedbackItem {
        platform: Platform::TechNews,
        content,
        author,
        url,
        posted_at,
        metadata: serde_json::json!({
            "story_id": item.id,
            "score": item.score,
            "comment_count": item.kids.len(),
        }),
    })
}

fn epoch_to_datetime(epoch_secs: i64) -> Option<DateTime<Utc>> {
    if epoch_secs < 0 {
        return None;
    }
    DateTime::from_timestamp(epoch_secs, 0)
}
