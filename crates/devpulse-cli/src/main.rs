//! DevPulse command line interface.
//!
//! Wires configuration, the database pool, the fetch client, and the
//! enrichment engine together and drives the pipeline. All clients are
//! constructed here once and passed down by dependency injection.

use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use devpulse_core::{AppConfig, RecencyWindow};
use devpulse_enrich::{EngineConfig, EnrichmentEngine, LlmClient};
use devpulse_fetch::FetchClient;
use devpulse_pipeline::{recompute_daily, run_collection, Collectors};

#[derive(Debug, Parser)]
#[command(name = "devpulse")]
#[command(about = "Developer feedback collection and enrichment pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline: collect, dedupe, persist, enrich, aggregate
    Run {
        /// Recency window in days (defaults to DEVPULSE_COLLECT_WINDOW_DAYS)
        #[arg(long)]
        days: Option<i64>,

        /// Abort collection after this many seconds, keeping partial results
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Enrich stored items that have no analysis yet
    Enrich {
        /// Maximum number of backlog items to analyze
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Recompute the daily aggregate for a date (defaults to today, UTC)
    Aggregate {
        /// Date in YYYY-MM-DD form
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = devpulse_core::load_app_config().context("loading configuration")?;
    init_tracing(&config);

    let pool = devpulse_db::connect_pool(
        &config.database_url,
        devpulse_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("connecting to database")?;

    match cli.command {
        Commands::Run {
            days,
            deadline_secs,
        } => {
            let platforms = devpulse_core::load_platforms(&config.platforms_path)
                .with_context(|| format!("loading {}", config.platforms_path.display()))?;

            let client = FetchClient::new(
                config.fetch_timeout_secs,
                &config.fetch_user_agent,
                config.fetch_max_retries,
                config.fetch_backoff_base_secs,
            )
            .context("building fetch client")?;

            let collectors = Collectors::from_config(&client, &platforms);
            let engine = build_engine(&config)?;

            let window = RecencyWindow::last_days(days.unwrap_or(config.collect_window_days));
            let deadline = deadline_secs
                .or(config.run_deadline_secs)
                .map(Duration::from_secs);

            let report =
                run_collection(&pool, collectors, &engine, window, deadline, config.enrich_backlog_limit)
                    .await;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Enrich { limit } => {
            let engine = build_engine(&config)?;
            let limit = limit.unwrap_or(config.enrich_backlog_limit);

            let rows = devpulse_db::query_unanalyzed(&pool, limit)
                .await
                .context("querying unanalyzed items")?;
            if rows.is_empty() {
                println!("nothing to enrich");
                return Ok(());
            }

            let targets: Vec<_> = rows.into_iter().map(|row| (row.id, row.to_item())).collect();
            let total = targets.len();
            let results = engine.enrich_batch(targets).await;

            let mut written = 0usize;
            for (feedback_id, result) in results {
                match devpulse_db::insert_enrichment_result(&pool, feedback_id, &result).await {
                    Ok(_) => written += 1,
                    Err(e) => {
                        tracing::warn!(feedback_id, error = %e, "enrichment insert failed");
                    }
                }
            }
            println!("enriched {written}/{total} items (llm calls: {})", engine.llm_calls_used());
        }
        Commands::Aggregate { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let row = recompute_daily(&pool, date)
                .await
                .with_context(|| format!("recomputing aggregate for {date}"))?;
            println!(
                "{date}: total={} avg_sentiment={} active_platforms={} critical={}",
                row.total_feedback,
                row.average_sentiment
                    .map_or_else(|| "n/a".to_string(), |d| d.to_string()),
                row.active_platforms,
                row.critical_issues,
            );
        }
        Commands::Migrate => {
            devpulse_db::run_migrations(&pool)
                .await
                .context("running migrations")?;
            println!("migrations applied");
        }
    }

    Ok(())
}

/// Build the enrichment engine from config.
///
/// When no LLM endpoint is configured the call ceiling is zeroed, which
/// routes every item through the deterministic fallback scorer.
fn build_engine(config: &AppConfig) -> anyhow::Result<EnrichmentEngine<LlmClient>> {
    let endpoint = config
        .llm_api_url
        .clone()
        .unwrap_or_else(|| "http://127.0.0.1:11434/v1/chat/completions".to_string());

    let max_llm_calls = if config.llm_api_url.is_some() {
        config.enrich_max_llm_calls
    } else {
        tracing::info!("DEVPULSE_LLM_API_URL not set — enrichment runs fallback-only");
        0
    };

    let client = LlmClient::new(
        &endpoint,
        config.llm_api_key.as_deref(),
        &config.llm_model,
        config.fetch_timeout_secs,
    )
    .context("building generative-text client")?;

    Ok(EnrichmentEngine::new(
        client,
        EngineConfig {
            max_llm_calls,
            max_retries: config.enrich_max_retries,
            retry_base_ms: config.enrich_retry_base_ms,
            batch_size: config.enrich_batch_size,
            batch_delay_ms: config.enrich_batch_delay_ms,
            concurrency: config.enrich_concurrency,
        },
    ))
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
