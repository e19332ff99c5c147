//! Batch apply
//!
//! Applies a `video_id -> milestone ids` mapping to the association store one
//! video at a time. A failing video is rolled back and reported; the run moves
//! on to the next one.

use crate::store::AssociationStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Video whose transaction failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedVideo {
    pub video_id: i64,
    pub message: String,
}

/// Per-run success/failure tally
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub applied_videos: usize,
    pub failed: Vec<FailedVideo>,
    pub inserted: u64,
    pub skipped_duplicates: u64,
    pub removed: u64,

    /// Input records skipped while planning (filled in by the caller)
    pub rejected_inputs: usize,
}

impl RunReport {
    fn new(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            applied_videos: 0,
            failed: Vec::new(),
            inserted: 0,
            skipped_duplicates: 0,
            removed: 0,
            rejected_inputs: 0,
        }
    }

    /// True when every video in the mapping was applied
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Ids of videos worth retrying
    pub fn failed_video_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|f| f.video_id).collect()
    }

    pub fn log_summary(&self) {
        let elapsed_ms = (self.finished_at - self.started_at).num_milliseconds();
        if self.is_success() {
            info!(
                run_id = %self.run_id,
                applied = self.applied_videos,
                inserted = self.inserted,
                skipped_duplicates = self.skipped_duplicates,
                removed = self.removed,
                rejected_inputs = self.rejected_inputs,
                elapsed_ms,
                "Association run complete"
            );
        } else {
            warn!(
                run_id = %self.run_id,
                applied = self.applied_videos,
                failed = self.failed.len(),
                failed_videos = ?self.failed_video_ids(),
                rejected_inputs = self.rejected_inputs,
                elapsed_ms,
                "Association run finished with failures"
            );
        }
    }
}

/// Apply every entry of `mapping`, in video id order
pub async fn apply_plan(
    store: &AssociationStore,
    mapping: &BTreeMap<i64, Vec<i64>>,
    run_id: Uuid,
) -> RunReport {
    let mut report = RunReport::new(run_id);

    for (video_id, milestone_ids) in mapping {
        match store.apply(*video_id, milestone_ids).await {
            Ok(outcome) => {
                report.applied_videos += 1;
                report.inserted += outcome.inserted;
                report.skipped_duplicates += outcome.skipped_duplicates;
                report.removed += outcome.removed;
                info!(
                    run_id = %run_id,
                    video_id,
                    milestones = ?milestone_ids,
                    "Applied associations"
                );
            }
            Err(err) => {
                warn!(
                    run_id = %run_id,
                    video_id,
                    error = %err,
                    "Video rolled back"
                );
                report.failed.push(FailedVideo {
                    video_id: *video_id,
                    message: err.to_string(),
                });
            }
        }
    }

    report.finished_at = Utc::now();
    report
}
