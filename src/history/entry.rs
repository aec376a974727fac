use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{ExecutionResult, ResultSource, RunOptions};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A past invocation together with the options that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub status_code: u16,
    pub source: ResultSource,
    pub duration_ms: u64,
    pub snapshot_options: RunOptions,
}

impl HistoryEntry {
    /// Snapshots `options`; later edits to the caller's options do not reach the entry.
    pub fn new(options: &RunOptions, result: &ExecutionResult) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            status_code: result.status_code,
            source: result.source,
            duration_ms: result.duration_ms,
            snapshot_options: options.clone(),
        }
    }

    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
