//! Article-feed collector (tag-filtered article listing API).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use devpulse_core::{ArticlesConfig, FeedbackItem, Platform, RecencyWindow};
use devpulse_fetch::{FetchClient, Pacer};

use crate::CollectorOutput;

/// One article from `GET {base}/api/articles?tag={tag}&per_page=N`.
#[derive(Debug, Deserialize)]
struct Article {
    id: u64,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    user: Option<ArticleUser>,
    #[serde(default)]
    public_reactions_count: Option<u32>,
    #[serde(default)]
    comments_count: Option<u32>,
    #[serde(default)]
    tag_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleUser {
    username: Option<String>,
}

/// Collects recent articles for the configured tags.
pub struct ArticlesCollector {
    client: FetchClient,
    pacer: Pacer,
    config: ArticlesConfig,
}

impl ArticlesCollector {
    #[must_use]
    pub fn new(client: FetchClient, config: ArticlesConfig) -> Self {
        let pacer = Pacer::from_millis(config.pace_ms);
        Self {
            client,
            pacer,
            config,
        }
    }

    /// Fetch each configured tag feed and map articles inside `window`.
    ///
    /// An unknown tag (404) is an empty result. Any other failure is logged
    /// and recorded as an error marker; remaining tags are still queried.
    pub async fn collect(&self, window: RecencyWindow) -> CollectorOutput {
        let mut output = CollectorOutput::default();
        let base = self.config.base_url.trim_end_matches('/');

        for tag in &self.config.tags {
            self.pacer.pause().await;
            let url = format!(
                "{base}/api/articles?tag={tag}&per_page={}",
                self.config.per_page
            );

            match self.client.get_json::<Vec<Article>>(&url).await {
                Ok(articles) => {
                    let before = output.items.len();
                    output.items.extend(
                        articles
                            .iter()
                            .filter_map(article_to_item)
                            .filter(|item| window.contains(item.posted_at)),
                    );
                    tracing::debug!(
                        tag = %tag,
                        count = output.items.len() - before,
                        "collected articles"
                    );
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(tag = %tag, "article tag not found — treating as empty");
                }
                Err(e) => {
                    tracing::warn!(tag = %tag, error = %e, "article tag query failed");
                    output.errors.push(format!("tag '{tag}': {e}"));
                }
            }
        }

        output
    }
}

/// Map one article to a canonical item. Articles without a title, URL, or
/// parseable publication time are skipped.
fn article_to_item(article: &Article) -> Option<FeedbackItem> {
    let title = article
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    let url = article.url.as_deref().filter(|u| !u.is_empty())?;
    let posted_at = parse_timestamp(article.published_at.as_deref()?)?;

    let content = match article.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => format!("{title}\n\n{description}"),
        _ => title.to_string(),
    };

    let author = article
        .user
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown")
        .to_string();

    Some(FeedbackItem {
        platform: Platform::Articles,
        content,
        author,
        url: url.to_string(),
        posted_at,
        metadata: serde_json::json!({
            "article_id": article.id,
            "reactions": article.public_reactions_count,
            "comments_count": article.comments_count,
            "tags": article.tag_list,
        }),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
