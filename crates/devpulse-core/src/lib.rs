//! Shared domain types and configuration for DevPulse.
//!
//! Defines the canonical [`FeedbackItem`] that every collector produces, the
//! [`Platform`] enum, recency windows, application config loaded from the
//! environment, and the platform query configuration read from
//! `config/platforms.yaml`.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod enrichment;
pub mod platforms;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use enrichment::{
    priority_from, CompetitorMention, EnrichmentResult, EnrichmentSource, FeatureRequest, Intent,
    PainPoint, SentimentLabel,
};
pub use platforms::{
    load_platforms, ArticlesConfig, ForumConfig, PlatformsFile, SocialConfig, TechNewsConfig,
};
pub use types::{FeedbackItem, Platform, RecencyWindow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read platforms file {path}: {source}")]
    PlatformsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(#[from] serde_yaml::Error),

    #[error("platforms file validation failed: {0}")]
    Validation(String),
}
