//! Handoff to durable storage
//!
//! Enumerates the artifacts surviving a session, uploads each under a key
//! bucketed by the session's earliest creation time, and deletes local
//! copies on confirmed success. Failed uploads leave the local artifact in
//! place; the next handoff attempt retries idempotently by filename.

mod uploader;

pub use uploader::{ArtifactUploader, HttpUploader};

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::{Artifact, SegmentStore};

/// One artifact that could not be finalized this attempt
#[derive(Debug)]
pub struct RetainedArtifact {
    pub file_name: String,
    pub error: anyhow::Error,
}

/// What a handoff attempt accomplished.
///
/// Retained artifacts are the only faults a caller should surface to an end
/// user ("some artifacts could not be finalized, will retry").
#[derive(Debug, Default)]
pub struct HandoffReport {
    pub uploaded: Vec<String>,
    pub retained: Vec<RetainedArtifact>,
}

/// Transfers surviving artifacts to the storage collaborator.
pub struct HandoffRunner {
    store: Arc<SegmentStore>,
    uploader: Arc<dyn ArtifactUploader>,
}

impl HandoffRunner {
    pub fn new(store: Arc<SegmentStore>, uploader: Arc<dyn ArtifactUploader>) -> Self {
        Self { store, uploader }
    }

    /// Hand off everything left in a session's store.
    ///
    /// Upload keys follow `{session}/{channel}/{earliest_ms}/{filename}`,
    /// where `earliest_ms` is the smallest creation time across the
    /// remaining artifacts. Uploads run concurrently; each settles
    /// independently.
    pub async fn run(&self, session_id: &str, channel_id: &str) -> Result<HandoffReport> {
        let artifacts = self.store.list_artifacts(session_id)?;

        if artifacts.is_empty() {
            info!("No artifacts to hand off for session {}", session_id);
            return Ok(HandoffReport::default());
        }

        // list_artifacts sorts by key, so the first entry holds the bucket
        // timestamp for the whole batch.
        let earliest_ms = artifacts[0].key.created_at_ms;

        info!(
            "Handing off {} artifact(s) for session {} (bucket {})",
            artifacts.len(),
            session_id,
            earliest_ms
        );

        let uploads = artifacts
            .into_iter()
            .map(|artifact| self.upload_one(session_id, channel_id, earliest_ms, artifact));

        let mut report = HandoffReport::default();
        for result in futures::future::join_all(uploads).await {
            match result {
                Ok(file_name) => report.uploaded.push(file_name),
                Err(retained) => report.retained.push(retained),
            }
        }

        if !report.retained.is_empty() {
            warn!(
                "{} artifact(s) could not be finalized and were retained for retry",
                report.retained.len()
            );
        }

        Ok(report)
    }

    async fn upload_one(
        &self,
        session_id: &str,
        channel_id: &str,
        earliest_ms: i64,
        artifact: Artifact,
    ) -> std::result::Result<String, RetainedArtifact> {
        let key = format!(
            "{}/{}/{}/{}",
            session_id, channel_id, earliest_ms, artifact.file_name
        );

        let bytes = match tokio::fs::read(&artifact.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(RetainedArtifact {
                    file_name: artifact.file_name,
                    error: anyhow::Error::from(e).context("Failed to read artifact"),
                })
            }
        };

        match self
            .uploader
            .put(&key, bytes, artifact.kind.content_type())
            .await
        {
            Ok(()) => {
                info!("Uploaded {}", key);
                if let Err(e) = self.store.delete(&artifact.path) {
                    warn!("Uploaded {} but failed to delete local copy: {:#}", key, e);
                }
                Ok(artifact.file_name)
            }
            Err(error) => {
                warn!("Upload failed for {}, retaining local copy: {:#}", key, error);
                Err(RetainedArtifact {
                    file_name: artifact.file_name,
                    error,
                })
            }
        }
    }
}
