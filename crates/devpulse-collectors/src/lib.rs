//! Platform collectors for DevPulse.
//!
//! Each collector knows one platform's query shape and response schema and
//! produces canonical [`devpulse_core::FeedbackItem`]s. Collectors never
//! abort because one sub-query failed: failures are logged, recorded as
//! error markers in the [`CollectorOutput`], and collection continues with
//! the remaining queries. A 404 on a sub-query (unknown tag or community) is
//! an empty result, not an error.
//!
//! Also home to the [`dedup`] stage that collapses repeated items by their
//! `(platform, author, content)` identity.

pub mod articles;
pub mod dedup;
pub mod forum;
pub mod social;
pub mod technews;

pub use articles::ArticlesCollector;
pub use dedup::{dedup_items, dedup_key, retain_new};
pub use forum::ForumCollector;
pub use social::SocialCollector;
pub use technews::TechNewsCollector;

use devpulse_core::FeedbackItem;

/// Result of one collector run: everything successfully gathered plus an
/// error marker per failed sub-query.
#[derive(Debug, Default)]
pub struct CollectorOutput {
    /// Items in source order, already filtered to the recency window.
    pub items: Vec<FeedbackItem>,
    /// One human-readable marker per failed sub-query, for the run report.
    pub errors: Vec<String>,
}

impl CollectorOutput {
    /// `true` when every sub-query completed (an empty result still counts
    /// as success).
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
