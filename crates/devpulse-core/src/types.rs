//! Canonical feedback types shared across collectors, enrichment, and storage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Source platform a feedback item was collected from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Forum,
    Social,
    TechNews,
    Articles,
    /// Reserved for editorial/news sources; no collector currently targets it,
    /// but stored rows may carry it.
    News,
}

impl Platform {
    /// All platforms that have a collector.
    pub const COLLECTED: [Platform; 4] = [
        Platform::Forum,
        Platform::Social,
        Platform::TechNews,
        Platform::Articles,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Forum => "forum",
            Platform::Social => "social",
            Platform::TechNews => "technews",
            Platform::Articles => "articles",
            Platform::News => "news",
        }
    }

    /// Parse a stored platform string. Unknown values return `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forum" => Some(Platform::Forum),
            "social" => Some(Platform::Social),
            "technews" => Some(Platform::TechNews),
            "articles" => Some(Platform::Articles),
            "news" => Some(Platform::News),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of external developer commentary, normalized at the
/// collector boundary.
///
/// `(platform, author, content)` is the deduplication identity; items with
/// empty `content` are rejected before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub platform: Platform,
    /// Text body. Required, non-empty.
    pub content: String,
    /// Display name of the author; `"unknown"` when the source omits it.
    pub author: String,
    /// Canonical source link.
    pub url: String,
    /// Source-reported creation time.
    pub posted_at: DateTime<Utc>,
    /// Platform-specific fields (reply counts, scores, tags, category).
    pub metadata: serde_json::Value,
}

impl FeedbackItem {
    /// `true` when the item carries usable content.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Half-open recency window `[since, until)` bounding a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl RecencyWindow {
    /// Window covering the last `days` days, ending now.
    #[must_use]
    pub fn last_days(days: i64) -> Self {
        let until = Utc::now();
        Self {
            since: until - Duration::days(days),
            until,
        }
    }

    /// Window with explicit bounds.
    #[must_use]
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self { since, until }
    }

    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && ts < self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn platform_round_trips_through_strings() {
        for platform in [
            Platform::Forum,
            Platform::Social,
            Platform::TechNews,
            Platform::Articles,
            Platform::News,
        ] {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
        }
    }

    #[test]
    fn platform_parse_rejects_unknown() {
        assert_eq!(Platform::parse("mastodon"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn platform_serializes_lowercase() {
        let json = serde_json::to_string(&Platform::TechNews).unwrap();
        assert_eq!(json, "\"technews\"");
    }

    #[test]
    fn window_contains_is_half_open() {
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let window = RecencyWindow::new(since, until);

        assert!(window.contains(since));
        assert!(window.contains(until - Duration::seconds(1)));
        assert!(!window.contains(until));
        assert!(!window.contains(since - Duration::seconds(1)));
    }

    #[test]
    fn empty_content_is_detected() {
        let item = FeedbackItem {
            platform: Platform::Forum,
            content: "   ".to_string(),
            author: "alice".to_string(),
            url: "https://forum.example.com/t/1".to_string(),
            posted_at: Utc::now(),
            metadata: serde_json::json!({}),
        };
        assert!(!item.has_content());
    }
}
