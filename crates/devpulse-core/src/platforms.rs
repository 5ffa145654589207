//! Platform query configuration, loaded from `config/platforms.yaml`.
//!
//! Each section is optional: a platform absent from the file is simply not
//! collected. Query lists (tags, communities) drive the sub-queries a
//! collector issues; `pace_ms` is the minimum delay between successive
//! requests to that platform.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

fn default_pace_ms() -> u64 {
    1_500
}

fn default_per_page() -> u32 {
    30
}

fn default_scan_limit() -> usize {
    40
}

/// Discussion-forum listing API (Discourse-style tag feeds).
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    pub base_url: String,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    pub tags: Vec<String>,
}

/// Social link-aggregator listing API (community feeds).
#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    pub base_url: String,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    pub communities: Vec<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Tech-news item API (id-addressable items behind a story-id listing).
#[derive(Debug, Clone, Deserialize)]
pub struct TechNewsConfig {
    pub base_url: String,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    /// Maximum number of story ids fetched per run.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,
}

/// Article-feed API with tag filtering.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticlesConfig {
    pub base_url: String,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    pub tags: Vec<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsFile {
    pub forum: Option<ForumConfig>,
    pub social: Option<SocialConfig>,
    pub technews: Option<TechNewsConfig>,
    pub articles: Option<ArticlesConfig>,
}

/// Load and validate the platform configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let platforms: PlatformsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::PlatformsFileParse)?;

    validate_platforms(&platforms)?;

    Ok(platforms)
}

fn validate_platforms(platforms: &PlatformsFile) -> Result<(), ConfigError> {
    if let Some(forum) = &platforms.forum {
        validate_base_url("forum", &forum.base_url)?;
        validate_query_list("forum", "tags", &forum.tags)?;
    }
    if let Some(social) = &platforms.social {
        validate_base_url("social", &social.base_url)?;
        validate_query_list("social", "communities", &social.communities)?;
    }
    if let Some(technews) = &platforms.technews {
        validate_base_url("technews", &technews.base_url)?;
        if technews.scan_limit == 0 {
            return Err(ConfigError::Validation(
                "technews scan_limit must be at least 1".to_string(),
            ));
        }
    }
    if let Some(articles) = &platforms.articles {
        validate_base_url("articles", &articles.base_url)?;
        validate_query_list("articles", "tags", &articles.tags)?;
    }
    Ok(())
}

fn validate_base_url(section: &str, base_url: &str) -> Result<(), ConfigError> {
    if base_url.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{section} base_url must be non-empty"
        )));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{section} base_url must start with http:// or https://, got '{base_url}'"
        )));
    }
    Ok(())
}

fn validate_query_list(section: &str, field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{section} {field} must list at least one entry"
        )));
    }
    let mut seen = HashSet::new();
    for value in values {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{section} {field} contains an empty entry"
            )));
        }
        if !seen.insert(value.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "{section} {field} contains duplicate entry '{value}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<PlatformsFile, ConfigError> {
        let platforms: PlatformsFile = serde_yaml::from_str(yaml)?;
        validate_platforms(&platforms)?;
        Ok(platforms)
    }

    #[test]
    fn full_file_parses_with_defaults_applied() {
        let platforms = parse(
            r"
forum:
  base_url: https://forum.example.com
  tags: [bug, feedback]
social:
  base_url: https://social.example.com
  communities: [devtools]
technews:
  base_url: https://news.example.com
articles:
  base_url: https://articles.example.com
  tags: [devtools]
",
        )
        .expect("valid file should parse");

        let forum = platforms.forum.expect("forum section");
        assert_eq!(forum.tags, vec!["bug", "feedback"]);
        assert_eq!(forum.pace_ms, 1_500);
        assert_eq!(platforms.social.expect("social section").per_page, 30);
        assert_eq!(platforms.technews.expect("technews section").scan_limit, 40);
    }

    #[test]
    fn missing_sections_are_allowed() {
        let platforms = parse(
            r"
forum:
  base_url: https://forum.example.com
  tags: [bug]
",
        )
        .expect("partial file should parse");
        assert!(platforms.social.is_none());
        assert!(platforms.technews.is_none());
        assert!(platforms.articles.is_none());
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        let result = parse(
            r"
forum:
  base_url: https://forum.example.com
  tags: []
",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn duplicate_communities_are_rejected() {
        let result = parse(
            r"
social:
  base_url: https://social.example.com
  communities: [devtools, DevTools]
",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let result = parse(
            r"
articles:
  base_url: ftp://articles.example.com
  tags: [devtools]
",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_scan_limit_is_rejected() {
        let result = parse(
            r"
technews:
  base_url: https://news.example.com
  scan_limit: 0
",
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
