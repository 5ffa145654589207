//! Deduplication of feedback items by `(platform, author, content)`.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use devpulse_core::{FeedbackItem, Platform};

/// Hex SHA-256 digest over `platform \0 author \0 content`.
///
/// The NUL separator prevents boundary collisions between author and content.
/// The same digest is stored in the `dedup_key` column, so in-process and
/// against-storage passes compare the same keys.
#[must_use]
pub fn dedup_key(platform: Platform, author: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(platform.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(author.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Collapse repeated items, keeping the first occurrence in input order.
///
/// O(n) via a seen-set. Idempotent: running it twice yields the same result
/// as running it once.
#[must_use]
pub fn dedup_items(items: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(item.platform, &item.author, &item.content)))
        .collect()
}

/// Drop items whose dedup key is already present in `existing` (keys of rows
/// already stored for the same platform and window).
#[must_use]
pub fn retain_new(items: Vec<FeedbackItem>, existing: &HashSet<String>) -> Vec<FeedbackItem> {
    items
        .into_iter()
        .filter(|item| !existing.contains(&dedup_key(item.platform, &item.author, &item.content)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(platform: Platform, author: &str, content: &str) -> FeedbackItem {
        FeedbackItem {
            platform,
            content: content.to_string(),
            author: author.to_string(),
            url: format!("https://example.com/{author}"),
            posted_at: Utc::now(),
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn triple_identity_collapses_to_two() {
        let items = vec![
            item(Platform::Forum, "alice", "X"),
            item(Platform::Forum, "alice", "X"),
            item(Platform::Social, "bob", "Y"),
        ];
        let deduped = dedup_items(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].author, "alice");
        assert_eq!(deduped[1].author, "bob");
    }

    #[test]
    fn same_content_different_platform_is_kept() {
        let items = vec![
            item(Platform::Forum, "alice", "X"),
            item(Platform::Social, "alice", "X"),
        ];
        assert_eq!(dedup_items(items).len(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let items = vec![
            item(Platform::Forum, "alice", "X"),
            item(Platform::Forum, "alice", "X"),
            item(Platform::Social, "bob", "Y"),
            item(Platform::Social, "bob", "Y"),
        ];
        let once = dedup_items(items);
        let keys_once: Vec<String> = once
            .iter()
            .map(|i| dedup_key(i.platform, &i.author, &i.content))
            .collect();
        let twice = dedup_items(once);
        let keys_twice: Vec<String> = twice
            .iter()
            .map(|i| dedup_key(i.platform, &i.author, &i.content))
            .collect();
        assert_eq!(keys_once, keys_twice);
    }

    #[test]
    fn first_occurrence_order_is_preserved() {
        let items = vec![
            item(Platform::Forum, "carol", "first"),
            item(Platform::Forum, "alice", "second"),
            item(Platform::Forum, "carol", "first"),
            item(Platform::Forum, "bob", "third"),
        ];
        let deduped = dedup_items(items);
        let authors: Vec<&str> = deduped.iter().map(|i| i.author.as_str()).collect();
        assert_eq!(authors, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn nul_separator_prevents_boundary_collisions() {
        // ("ab", "c") and ("a", "bc") must not collide.
        let a = dedup_key(Platform::Forum, "ab", "c");
        let b = dedup_key(Platform::Forum, "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn retain_new_drops_already_stored_keys() {
        let stored = item(Platform::Forum, "alice", "X");
        let fresh = item(Platform::Forum, "bob", "Y");
        let mut existing = HashSet::new();
        existing.insert(dedup_key(
            stored.platform,
            &stored.author,
            &stored.content,
        ));

        let kept = retain_new(vec![stored, fresh], &existing);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].author, "bob");
    }

    #[test]
    fn dedup_key_is_stable_hex() {
        let key = dedup_key(Platform::Forum, "alice", "X");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, dedup_key(Platform::Forum, "alice", "X"));
    }
}
