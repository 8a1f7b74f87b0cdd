use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::handoff::HandoffRunner;
use crate::merge::{group_segments, MergeExecutor, MergeOutcome};
use crate::store::SegmentStore;
use crate::transcribe::{TranscriptionOutcome, TranscriptionQueue};

use super::stats::SessionReport;

/// Post-capture pipeline: group → merge → transcribe → handoff.
///
/// Stages run strictly in order; each stage's faults are contained in its
/// outcome list, so the processor always reaches handoff. Because the store
/// is the source of truth, `process` is equally a crash-recovery entry
/// point: pointing it at a directory left by a dead run finishes the job.
pub struct SessionProcessor {
    store: Arc<SegmentStore>,
    merge_executor: Arc<MergeExecutor>,
    transcription: Arc<TranscriptionQueue>,
    handoff: Arc<HandoffRunner>,
    adjacency_threshold_ms: i64,
}

impl SessionProcessor {
    pub fn new(
        store: Arc<SegmentStore>,
        merge_executor: Arc<MergeExecutor>,
        transcription: Arc<TranscriptionQueue>,
        handoff: Arc<HandoffRunner>,
        adjacency_threshold_ms: i64,
    ) -> Self {
        Self {
            store,
            merge_executor,
            transcription,
            handoff,
            adjacency_threshold_ms,
        }
    }

    /// Process everything a session left in the store.
    pub async fn process(&self, session_id: &str, channel_id: &str) -> Result<SessionReport> {
        info!("Processing session {}", session_id);

        let mut report = SessionReport::default();

        let segments = self.store.list_closed(session_id)?;
        report.segments = segments.len();

        let groups = group_segments(segments, self.adjacency_threshold_ms);
        report.merge_groups = groups.len();

        let merge_outcomes = self.merge_executor.execute(session_id, groups).await;
        report.merge_failures = merge_outcomes
            .iter()
            .filter(|o| matches!(o, MergeOutcome::Failed { .. }))
            .count();

        for outcome in self.transcription.submit_all(session_id).await? {
            match outcome {
                TranscriptionOutcome::Transcribed { .. } => report.transcribed += 1,
                TranscriptionOutcome::DiscardedEmpty { .. }
                | TranscriptionOutcome::DiscardedFailed { .. } => report.discarded += 1,
            }
        }

        let handoff_report = self.handoff.run(session_id, channel_id).await?;
        report.uploaded = handoff_report.uploaded.len();
        report.retained = handoff_report
            .retained
            .iter()
            .map(|r| format!("{}: {:#}", r.file_name, r.error))
            .collect();

        info!(
            "Session {} processed: {} segment(s), {} merge failure(s), {} transcribed, {} discarded, {} uploaded, {} retained",
            session_id,
            report.segments,
            report.merge_failures,
            report.transcribed,
            report.discarded,
            report.uploaded,
            report.retained.len()
        );

        Ok(report)
    }
}
