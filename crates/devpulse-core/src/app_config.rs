use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub platforms_path: PathBuf,

    /// Chat-completions endpoint of the generative-text service. When unset
    /// the enrichment engine runs fallback-only (its call ceiling is zeroed).
    pub llm_api_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,

    pub enrich_batch_size: usize,
    pub enrich_concurrency: usize,
    pub enrich_batch_delay_ms: u64,
    pub enrich_max_llm_calls: u32,
    pub enrich_max_retries: u32,
    pub enrich_retry_base_ms: u64,
    pub enrich_backlog_limit: i64,

    pub collect_window_days: i64,
    pub run_deadline_secs: Option<u64>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("platforms_path", &self.platforms_path)
            .field("database_url", &"[redacted]")
            .field("llm_api_url", &self.llm_api_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_backoff_base_secs", &self.fetch_backoff_base_secs)
            .field("enrich_batch_size", &self.enrich_batch_size)
            .field("enrich_concurrency", &self.enrich_concurrency)
            .field("enrich_batch_delay_ms", &self.enrich_batch_delay_ms)
            .field("enrich_max_llm_calls", &self.enrich_max_llm_calls)
            .field("enrich_max_retries", &self.enrich_max_retries)
            .field("enrich_retry_base_ms", &self.enrich_retry_base_ms)
            .field("enrich_backlog_limit", &self.enrich_backlog_limit)
            .field("collect_window_days", &self.collect_window_days)
            .field("run_deadline_secs", &self.run_deadline_secs)
            .finish()
    }
}
