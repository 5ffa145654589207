//! Run report types, produced once per orchestrator invocation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use devpulse_core::Platform;

/// Overall outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every collector delivered an outcome before the deadline.
    Completed,
    /// The deadline expired; in-flight collectors were abandoned and the
    /// results merged so far were kept and persisted.
    Partial,
}

/// Per-platform outcome line in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformReport {
    pub platform: Platform,
    pub items_collected: usize,
    /// `true` when every sub-query of the collector completed.
    pub success: bool,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Summary of one orchestrator invocation.
///
/// Ephemeral: consumed immediately by the caller; the collection-run audit
/// tables keep the durable trace.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub platforms: Vec<PlatformReport>,
    pub total_items_collected: usize,
    pub new_items_stored: usize,
    pub items_enriched: usize,
    /// Per-operation storage failures that did not stop the run.
    pub storage_errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunReport {
    /// `true` when at least one platform delivered a clean outcome.
    #[must_use]
    pub fn any_platform_succeeded(&self) -> bool {
        self.platforms.iter().any(|p| p.success)
    }
}
