//! Social link-aggregator collector (community listing API).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use devpulse_core::{FeedbackItem, Platform, RecencyWindow, SocialConfig};
use devpulse_fetch::{FetchClient, Pacer};

use crate::CollectorOutput;

const SNIPPET_CHARS: usize = 500;

/// Listing envelope: `GET {base}/r/{community}/new.json?limit=N`.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: Option<String>,
    selftext: Option<String>,
    author: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    num_comments: Option<u32>,
    created_utc: Option<f64>,
    permalink: Option<String>,
}

/// Collects recent posts from the configured communities.
pub struct SocialCollector {
    client: FetchClient,
    pacer: Pacer,
    config: SocialConfig,
}

impl SocialCollector {
    #[must_use]
    pub fn new(client: FetchClient, config: SocialConfig) -> Self {
        let pacer = Pacer::from_millis(config.pace_ms);
        Self {
            client,
            pacer,
            config,
        }
    }

    /// Fetch each configured community feed and map posts inside `window`.
    ///
    /// A missing community (404) is an empty result. Any other failure is
    /// logged and recorded as an error marker; remaining communities are
    /// still queried.
    pub async fn collect(&self, window: RecencyWindow) -> CollectorOutput {
        let mut output = CollectorOutput::default();
        let base = self.config.base_url.trim_end_matches('/');

        for community in &self.config.communities {
            self.pacer.pause().await;
            let url = format!(
                "{base}/r/{community}/new.json?limit={}",
                self.config.per_page
            );

            match self.client.get_json::<Listing>(&url).await {
                Ok(listing) => {
                    let before = output.items.len();
                    output.items.extend(
                        listing
                            .data
                            .children
                            .iter()
                            .filter_map(|post| post_to_item(base, community, &post.data))
                            .filter(|item| window.contains(item.posted_at)),
                    );
                    tracing::debug!(
                        community = %community,
                        count = output.items.len() - before,
                        "collected social posts"
                    );
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(
                        community = %community,
                        "community not found — treating as empty"
                    );
                }
                Err(e) => {
                    tracing::warn!(community = %community, error = %e, "community query failed");
                    output.errors.push(format!("community '{community}': {e}"));
                }
            }
        }

        output
    }
}

/// Map one post to a canonical item. Posts without a title, timestamp, or
/// permalink are skipped; `[deleted]`/`[removed]` bodies are dropped from the
/// content but the post itself is kept.
fn post_to_item(base_url: &str, community: &str, post: &PostData) -> Option<FeedbackItem> {
    let title = post.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let permalink = post.permalink.as_deref()?;
    let posted_at = epoch_to_datetime(post.created_utc?)?;

    let content = match post.selftext.as_deref().map(str::trim) {
        Some(body) if !body.is_empty() && body != "[deleted]" && body != "[removed]" => {
            let snippet: String = body.chars().take(SNIPPET_CHARS).collect();
            format!("{title}\n\n{snippet}")
        }
        _ => title.to_string(),
    };

    let author = post
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown")
        .to_string();

    Some(FeedbackItem {
        platform: Platform::Social,
        content,
        author,
        url: format!("{base_url}{permalink}"),
        posted_at,
        metadata: serde_json::json!({
            "community": community,
            "score": post.score,
            "num_comments": post.num_comments,
        }),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_to_datetime(epoch_secs: f64) -> Option<DateTime<Utc>> {
    if !epoch_secs.is_finite() || epoch_secs < 0.0 {
        return None;
    }
    DateTime::from_timestamp(epoch_secs as i64, 0)
}
