//! Run orchestration: collect → merge → dedup → persist → enrich → aggregate.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use devpulse_collectors::{
    dedup_items, dedup_key, retain_new, ArticlesCollector, CollectorOutput, ForumCollector,
    SocialCollector, TechNewsCollector,
};
use devpulse_core::{FeedbackItem, Platform, PlatformsFile, RecencyWindow};
use devpulse_db::{self as db, NewFeedbackItem};
use devpulse_enrich::{EnrichmentEngine, TextGenerator};
use devpulse_fetch::FetchClient;

use crate::aggregate::recompute_daily;
use crate::report::{PlatformReport, RunReport, RunStatus};

/// The per-platform collectors wired for one run. Platforms absent from the
/// configuration are simply not collected.
pub struct Collectors {
    pub forum: Option<ForumCollector>,
    pub social: Option<SocialCollector>,
    pub technews: Option<TechNewsCollector>,
    pub articles: Option<ArticlesCollector>,
}

impl Collectors {
    /// Build collectors from the platform configuration, sharing one fetch
    /// client (each collector keeps its own pacer).
    #[must_use]
    pub fn from_config(client: &FetchClient, platforms: &PlatformsFile) -> Self {
        Self {
            forum: platforms
                .forum
                .clone()
                .map(|c| ForumCollector::new(client.clone(), c)),
            social: platforms
                .social
                .clone()
                .map(|c| SocialCollector::new(client.clone(), c)),
            technews: platforms
                .technews
                .clone()
                .map(|c| TechNewsCollector::new(client.clone(), c)),
            articles: platforms
                .articles
                .clone()
                .map(|c| ArticlesCollector::new(client.clone(), c)),
        }
    }

    /// Platforms that will actually be collected this run.
    #[must_use]
    pub fn configured_platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::new();
        if self.forum.is_some() {
            platforms.push(Platform::Forum);
        }
        if self.social.is_some() {
            platforms.push(Platform::Social);
        }
        if self.technews.is_some() {
            platforms.push(Platform::TechNews);
        }
        if self.articles.is_some() {
            platforms.push(Platform::Articles);
        }
        platforms
    }
}

/// One collector's delivered outcome, handed to the orchestrator over the
/// merge channel.
struct PlatformOutcome {
    platform: Platform,
    output: CollectorOutput,
}

/// Run the full collection-and-enrichment pipeline.
///
/// Collector tasks are spawned one per configured platform and merge their
/// outcomes over an mpsc channel (single reader, no shared buffer). When
/// `deadline` expires mid-collection, unread collectors are abandoned, the
/// results merged so far are kept and persisted, and the report is marked
/// [`RunStatus::Partial`].
///
/// Every failure below the run boundary degrades to a marker: per-platform
/// errors in the report, per-operation storage errors in
/// `report.storage_errors`. This function never returns an error.
pub async fn run_collection<G: TextGenerator>(
    pool: &PgPool,
    collectors: Collectors,
    engine: &EnrichmentEngine<G>,
    window: RecencyWindow,
    deadline: Option<Duration>,
    backlog_limit: i64,
) -> RunReport {
    let started_at = Utc::now();
    let start = Instant::now();
    let expected = collectors.configured_platforms();

    let run_id = audit_run_created(pool).await;

    // -- Collect ------------------------------------------------------------
    let (outcomes, partial) = collect_phase(collectors, window, deadline).await;

    let mut platforms = Vec::with_capacity(expected.len());
    let mut collected_items: Vec<FeedbackItem> = Vec::new();
    let mut total_items_collected = 0;

    for outcome in outcomes {
        total_items_collected += outcome.output.items.len();
        platforms.push(PlatformReport {
            platform: outcome.platform,
            items_collected: outcome.output.items.len(),
            success: outcome.output.is_clean(),
            error: join_errors(&outcome.output.errors),
            finished_at: Utc::now(),
        });
        collected_items.extend(outcome.output.items);
    }

    // Platforms that never delivered before the deadline.
    let delivered: HashSet<Platform> = platforms.iter().map(|p| p.platform).collect();
    for platform in expected {
        if !delivered.contains(&platform) {
            tracing::warn!(platform = %platform, "collector abandoned at deadline");
            platforms.push(PlatformReport {
                platform,
                items_collected: 0,
                success: false,
                error: Some("abandoned at run deadline".to_string()),
                finished_at: Utc::now(),
            });
        }
    }

    let mut storage_errors: Vec<String> = Vec::new();

    // -- Dedup --------------------------------------------------------------
    // First pass collapses repeats within the batch; second pass excludes
    // keys already stored for the same platforms and window.
    let batch = dedup_items(collected_items);
    let batch: Vec<FeedbackItem> = batch.into_iter().filter(FeedbackItem::has_content).collect();

    let mut existing_keys: HashSet<String> = HashSet::new();
    let touched: BTreeSet<Platform> = batch.iter().map(|i| i.platform).collect();
    for platform in touched {
        match db::query_existing_keys(pool, platform, window.since).await {
            Ok(keys) => existing_keys.extend(keys),
            Err(e) => {
                // The dedup_key unique constraint still prevents duplicates;
                // conflict-skips just do the work the query would have saved.
                tracing::warn!(platform = %platform, error = %e, "existing-key query failed");
                storage_errors.push(format!("query_existing_keys({platform}): {e}"));
            }
        }
    }
    let new_items = retain_new(batch, &existing_keys);

    // -- Persist ------------------------------------------------------------
    let staged: Vec<NewFeedbackItem> = new_items
        .into_iter()
        .map(|item| {
            let key = dedup_key(item.platform, &item.author, &item.content);
            NewFeedbackItem {
                item,
                dedup_key: key,
            }
        })
        .collect();

    let inserted_ids = match db::insert_feedback_items(pool, &staged).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "feedback insert failed");
            storage_errors.push(format!("insert_feedback_items: {e}"));
            Vec::new()
        }
    };
    let new_items_stored = inserted_ids.len();
    tracing::info!(
        collected = total_items_collected,
        staged = staged.len(),
        stored = new_items_stored,
        "persisted collection batch"
    );

    // -- Enrich -------------------------------------------------------------
    let items_enriched = enrich_phase(
        pool,
        engine,
        &inserted_ids,
        backlog_limit,
        &mut storage_errors,
    )
    .await;

    // -- Aggregate ----------------------------------------------------------
    let mut dates: BTreeSet<chrono::NaiveDate> = BTreeSet::new();
    dates.insert(Utc::now().date_naive());
    for staged_item in &staged {
        dates.insert(staged_item.item.posted_at.date_naive());
    }
    for date in dates {
        if let Err(e) = recompute_daily(pool, date).await {
            tracing::warn!(date = %date, error = %e, "daily aggregate recompute failed");
            storage_errors.push(format!("recompute_daily({date}): {e}"));
        }
    }

    // -- Report -------------------------------------------------------------
    let completed_at = Utc::now();
    let report = RunReport {
        status: if partial {
            RunStatus::Partial
        } else {
            RunStatus::Completed
        },
        platforms,
        total_items_collected,
        new_items_stored,
        items_enriched,
        storage_errors,
        started_at,
        completed_at,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    audit_run_finished(pool, run_id, &report).await;

    report
}

/// Spawn one task per configured collector and merge outcomes over an mpsc
/// channel, bounded by the optional deadline. Returns the outcomes received
/// and whether the run was cut short.
async fn collect_phase(
    collectors: Collectors,
    window: RecencyWindow,
    deadline: Option<Duration>,
) -> (Vec<PlatformOutcome>, bool) {
    let deadline_at = deadline.map(|d| Instant::now() + d);
    let (tx, rx) = mpsc::channel::<PlatformOutcome>(8);
    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    let mut expected = 0usize;

    if let Some(collector) = collectors.forum {
        expected += 1;
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let output = collector.collect(window).await;
            let _ = tx
                .send(PlatformOutcome {
                    platform: Platform::Forum,
                    output,
                })
                .await;
        }));
    }
    if let Some(collector) = collectors.social {
        expected += 1;
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let output = collector.collect(window).await;
            let _ = tx
                .send(PlatformOutcome {
                    platform: Platform::Social,
                    output,
                })
                .await;
        }));
    }
    if let Some(collector) = collectors.technews {
        expected += 1;
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let output = collector.collect(window).await;
            let _ = tx
                .send(PlatformOutcome {
                    platform: Platform::TechNews,
                    output,
                })
                .await;
        }));
    }
    if let Some(collector) = collectors.articles {
        expected += 1;
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            let output = collector.collect(window).await;
            let _ = tx
                .send(PlatformOutcome {
                    platform: Platform::Articles,
                    output,
                })
                .await;
        }));
    }
    drop(tx);

    let (outcomes, partial) = merge_outcomes(rx, expected, deadline_at).await;

    if partial {
        for handle in &handles {
            handle.abort();
        }
    }

    (outcomes, partial)
}

/// Read up to `expected` outcomes from the channel, stopping early when the
/// deadline passes. Partial results read so far are kept.
async fn merge_outcomes(
    mut rx: mpsc::Receiver<PlatformOutcome>,
    expected: usize,
    deadline_at: Option<Instant>,
) -> (Vec<PlatformOutcome>, bool) {
    let mut outcomes = Vec::with_capacity(expected);

    while outcomes.len() < expected {
        let next = match deadline_at {
            Some(at) => match tokio::time::timeout_at(at, rx.recv()).await {
                Ok(received) => received,
                Err(_) => return (outcomes, true),
            },
            None => rx.recv().await,
        };
        match next {
            Some(outcome) => outcomes.push(outcome),
            // All senders dropped; nothing further will arrive.
            None => break,
        }
    }

    (outcomes, false)
}

/// Enrich newly stored rows plus a bounded backlog of previously unanalyzed
/// rows. Returns the number of results written.
async fn enrich_phase<G: TextGenerator>(
    pool: &PgPool,
    engine: &EnrichmentEngine<G>,
    inserted_ids: &[i64],
    backlog_limit: i64,
    storage_errors: &mut Vec<String>,
) -> usize {
    let mut targets: Vec<(i64, FeedbackItem)> = Vec::new();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    match db::get_feedback_by_ids(pool, inserted_ids).await {
        Ok(rows) => {
            for row in rows {
                seen_ids.insert(row.id);
                targets.push((row.id, row.to_item()));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "fetching newly stored rows failed");
            storage_errors.push(format!("get_feedback_by_ids: {e}"));
        }
    }

    if backlog_limit > 0 {
        match db::query_unanalyzed(pool, backlog_limit).await {
            Ok(rows) => {
                for row in rows {
                    if seen_ids.insert(row.id) {
                        targets.push((row.id, row.to_item()));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "unanalyzed backlog query failed");
                storage_errors.push(format!("query_unanalyzed: {e}"));
            }
        }
    }

    if targets.is_empty() {
        return 0;
    }

    tracing::info!(items = targets.len(), "enriching stored items");
    let results = engine.enrich_batch(targets).await;

    let mut written = 0usize;
    for (feedback_id, result) in results {
        match db::insert_enrichment_result(pool, feedback_id, &result).await {
            Ok(_) => written += 1,
            Err(e) => {
                tracing::warn!(feedback_id, error = %e, "enrichment insert failed");
                storage_errors.push(format!("insert_enrichment_result({feedback_id}): {e}"));
            }
        }
    }

    written
}

fn join_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Audit-log helpers: best effort, never fatal to the run.
// ---------------------------------------------------------------------------

async fn audit_run_created(pool: &PgPool) -> Option<i64> {
    match db::create_collection_run(pool, "full", "cli").await {
        Ok(run) => match db::start_collection_run(pool, run.id).await {
            Ok(()) => Some(run.id),
            Err(e) => {
                tracing::warn!(run_id = run.id, error = %e, "failed to start audit run row");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to create audit run row");
            None
        }
    }
}

async fn audit_run_finished(pool: &PgPool, run_id: Option<i64>, report: &RunReport) {
    let Some(run_id) = run_id else {
        return;
    };

    for platform in &report.platforms {
        let status = if platform.success { "succeeded" } else { "failed" };
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        if let Err(e) = db::upsert_collection_run_platform(
            pool,
            run_id,
            platform.platform.as_str(),
            status,
            platform.items_collected as i32,
            platform.error.as_deref(),
        )
        .await
        {
            tracing::warn!(run_id, error = %e, "failed to write platform audit row");
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let records = report.new_items_stored as i32;

    let outcome = if report.any_platform_succeeded() || report.platforms.is_empty() {
        db::complete_collection_run(pool, run_id, records, report.status == RunStatus::Partial)
            .await
    } else {
        db::fail_collection_run(pool, run_id, "all platforms failed collection").await
    };

    if let Err(e) = outcome {
        tracing::warn!(run_id, error = %e, "failed to finalize audit run row");
    }
}
