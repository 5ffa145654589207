//! Discussion-forum collector (Discourse-style tag listing API).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use devpulse_core::{FeedbackItem, ForumConfig, Platform, RecencyWindow};
use devpulse_fetch::{FetchClient, Pacer};

use crate::CollectorOutput;

/// Topic listing envelope: `GET {base}/tag/{tag}/l/latest.json`.
#[derive(Debug, Deserialize)]
struct TagListing {
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    title: Option<String>,
    excerpt: Option<String>,
    created_at: Option<String>,
    last_poster_username: Option<String>,
    #[serde(default)]
    reply_count: Option<u32>,
    #[serde(default)]
    views: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Collects recent topics from the configured forum tags.
pub struct ForumCollector {
    client: FetchClient,
    pacer: Pacer,
    config: ForumConfig,
}

impl ForumCollector {
    #[must_use]
    pub fn new(client: FetchClient, config: ForumConfig) -> Self {
        let pacer = Pacer::from_millis(config.pace_ms);
        Self {
            client,
            pacer,
            config,
        }
    }

    /// Fetch each configured tag feed and map topics inside `window`.
    ///
    /// An unknown tag (404) is an empty result. Any other failure is logged
    /// and recorded as an error marker; remaining tags are still queried.
    pub async fn collect(&self, window: RecencyWindow) -> CollectorOutput {
        let mut output = CollectorOutput::default();
        let base = self.config.base_url.trim_end_matches('/');

        for tag in &self.config.tags {
            self.pacer.pause().await;
            let url = format!("{base}/tag/{tag}/l/latest.json");

            match self.client.get_json::<TagListing>(&url).await {
                Ok(listing) => {
                    let before = output.items.len();
                    output.items.extend(
                        listing
                            .topic_list
                            .topics
                            .iter()
                            .filter_map(|topic| topic_to_item(base, topic))
                            .filter(|item| window.contains(item.posted_at)),
                    );
                    tracing::debug!(
                        tag = %tag,
                        count = output.items.len() - before,
                        "collected forum topics"
                    );
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(tag = %tag, "forum tag not found — treating as empty");
                }
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "forum tag query failed");
                    output.errors.push(format!("tag '{tag}': {e}"));
                }
            }
        }

        output
    }
}

/// Map one topic to a canonical item. Topics without a usable title or
/// creation time are skipped.
fn topic_to_item(base_url: &str, topic: &Topic) -> Option<FeedbackItem> {
    let title = topic.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let created_at = parse_timestamp(topic.created_at.as_deref()?)?;

    let content = match topic.excerpt.as_deref().map(str::trim) {
        Some(excerpt) if !excerpt.is_empty() => format!("{title}\n\n{excerpt}"),
        _ => title.to_string(),
    };

    let author = topic
        .last_poster_username
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown")
        .to_string();

    Some(FeedbackItem {
        platform: Platform::Forum,
        content,
        author,
        url: format!("{base_url}/t/{}", topic.id),
        posted_at: created_at,
        metadata: serde_json::json!({
            "topic_id": topic.id,
            "reply_count": topic.reply_count,
            "views": topic.views,
            "tags": topic.tags,
        }),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
