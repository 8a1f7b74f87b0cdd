use anyhow::{Context, Result};
use futures::stream::StreamExt;
use std::fs;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::store::{SegmentKey, SegmentStore};

use super::concat::Concatenator;
use super::grouper::MergeGroup;

/// Per-group merge result.
///
/// Failures are data, not control flow: one group's failure never blocks or
/// invalidates sibling groups.
#[derive(Debug)]
pub enum MergeOutcome {
    /// Single-segment group; no concatenation invoked
    PassThrough { key: SegmentKey },
    /// Constituents concatenated and deleted; the merged file carries the
    /// first constituent's key and stays closed
    Merged { key: SegmentKey, source_count: usize },
    /// Concatenation failed; all constituents left untouched and closed
    Failed {
        key: SegmentKey,
        source_count: usize,
        error: anyhow::Error,
    },
}

/// Runs concatenation jobs under a fixed concurrency ceiling.
///
/// The concatenator is an external process with real CPU/IO cost; the
/// ceiling keeps a session with many speakers from exhausting the host.
pub struct MergeExecutor {
    store: Arc<SegmentStore>,
    concatenator: Arc<dyn Concatenator>,
    max_concurrent: usize,
}

impl MergeExecutor {
    pub fn new(
        store: Arc<SegmentStore>,
        concatenator: Arc<dyn Concatenator>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            concatenator,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Execute all groups, at most `max_concurrent` concatenations in flight.
    ///
    /// Settle-all: every group produces an outcome, in completion order.
    pub async fn execute(&self, session_id: &str, groups: Vec<MergeGroup>) -> Vec<MergeOutcome> {
        if groups.is_empty() {
            info!("Nothing to merge for session {}", session_id);
            return Vec::new();
        }

        info!(
            "Merging {} group(s) for session {} (max {} concurrent)",
            groups.len(),
            session_id,
            self.max_concurrent
        );

        futures::stream::iter(
            groups
                .into_iter()
                .map(|group| self.run_group(session_id, group)),
        )
        .buffer_unordered(self.max_concurrent)
        .collect()
        .await
    }

    async fn run_group(&self, session_id: &str, group: MergeGroup) -> MergeOutcome {
        let key = group.first().key.clone();
        let source_count = group.len();

        if group.is_trivial() {
            return MergeOutcome::PassThrough { key };
        }

        match self.merge_group(session_id, &group).await {
            Ok(()) => {
                info!("Merged {} segments into {}", source_count, key);
                MergeOutcome::Merged { key, source_count }
            }
            Err(error) => {
                error!("Failed to merge group {}: {:#}", key, error);
                MergeOutcome::Failed {
                    key,
                    source_count,
                    error,
                }
            }
        }
    }

    /// Concatenate a group into a staging file, then swap it into place.
    ///
    /// The staging step keeps the session directory free of half-written
    /// merge outputs: originals are only deleted after the concatenator
    /// reported success.
    async fn merge_group(&self, session_id: &str, group: &MergeGroup) -> Result<()> {
        let staging_dir = self.store.staging_dir(session_id);
        fs::create_dir_all(&staging_dir)
            .with_context(|| format!("Failed to create staging directory {:?}", staging_dir))?;

        let first = group.first();
        let staged = staging_dir.join(first.key.audio_file_name());
        let inputs: Vec<_> = group.segments.iter().map(|s| s.path.clone()).collect();

        if let Err(e) = self.concatenator.concat(&inputs, &staged).await {
            // Never leave a stale staging artifact behind for the next run.
            if staged.exists() {
                if let Err(cleanup) = fs::remove_file(&staged) {
                    warn!("Failed to remove stale merge output {:?}: {}", staged, cleanup);
                }
            }
            return Err(e);
        }

        for segment in &group.segments {
            if let Err(e) = self.store.delete(&segment.path) {
                warn!("Failed to delete merged constituent {}: {:#}", segment.key, e);
            }
        }

        fs::rename(&staged, &first.path)
            .with_context(|| format!("Failed to move merged output into place for {}", first.key))?;

        Ok(())
    }
}
