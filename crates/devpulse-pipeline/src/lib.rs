//! Run orchestration and daily aggregation for DevPulse.
//!
//! The orchestrator sequences collectors under per-platform pacing, merges
//! and deduplicates their output, persists new items, drives enrichment over
//! the newly stored rows plus a bounded backlog, recomputes daily
//! aggregates, and returns a [`RunReport`]. Nothing propagates past the
//! orchestrator boundary: failures degrade to per-platform or per-operation
//! markers in the report.

pub mod aggregate;
pub mod orchestrator;
pub mod report;

pub use aggregate::{compute_daily_metrics, recompute_daily};
pub use orchestrator::{run_collection, Collectors};
pub use report::{PlatformReport, RunReport, RunStatus};
