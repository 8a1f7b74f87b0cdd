// Tests for the storage handoff: key composition, deletion on confirmed
// upload, and retention of failed artifacts for the next attempt.

use anyhow::{bail, Result};
use scribed::handoff::{ArtifactUploader, HandoffRunner};
use scribed::store::SegmentStore;
use std::fs;
use std::sync::Arc;
use std::sync::Mutex;
use tempfile::TempDir;

/// Uploader fake: records keys, optionally rejects keys by suffix
struct FakeUploader {
    uploads: Mutex<Vec<(String, String)>>,
    fail_suffix: Option<&'static str>,
}

impl FakeUploader {
    fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_suffix: None,
        }
    }

    fn failing_on(suffix: &'static str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_suffix: Some(suffix),
        }
    }

    fn keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .expect("uploads lock")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ArtifactUploader for FakeUploader {
    async fn put(&self, key: &str, _bytes: Vec<u8>, content_type: &str) -> Result<()> {
        if let Some(suffix) = self.fail_suffix {
            if key.ends_with(suffix) {
                bail!("storage rejected {}", key);
            }
        }
        self.uploads
            .lock()
            .expect("uploads lock")
            .push((key.to_string(), content_type.to_string()));
        Ok(())
    }
}

fn seed(store: &SegmentStore, session: &str, name: &str, data: &[u8]) -> Result<()> {
    let dir = store.session_dir(session);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(name), data)?;
    Ok(())
}

#[tokio::test]
async fn test_handoff_uploads_under_earliest_time_bucket() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed(&store, "guild-1", "3000-bob.wav", b"late")?;
    seed(&store, "guild-1", "1000-alice.wav", b"early")?;
    seed(&store, "guild-1", "1000-alice.txt", b"hello")?;

    let uploader = Arc::new(FakeUploader::new());
    let uploader_dyn: Arc<dyn ArtifactUploader> = uploader.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), uploader_dyn);

    let report = runner.run("guild-1", "voice-chan").await?;

    assert_eq!(report.uploaded.len(), 3);
    assert!(report.retained.is_empty());

    // Every key is bucketed by the earliest creation time in the batch
    let mut keys = uploader.keys();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "guild-1/voice-chan/1000/1000-alice.txt".to_string(),
            "guild-1/voice-chan/1000/1000-alice.wav".to_string(),
            "guild-1/voice-chan/1000/3000-bob.wav".to_string(),
        ]
    );

    // Local copies are gone after confirmed upload
    assert!(store.list_artifacts("guild-1")?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_content_types_follow_artifact_kind() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed(&store, "g", "1000-alice.wav", b"audio")?;
    seed(&store, "g", "1000-alice.txt", b"text")?;

    let uploader = Arc::new(FakeUploader::new());
    let uploader_dyn: Arc<dyn ArtifactUploader> = uploader.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), uploader_dyn);

    runner.run("g", "c").await?;

    let uploads = uploader.uploads.lock().expect("uploads lock").clone();
    for (key, content_type) in uploads {
        if key.ends_with(".wav") {
            assert_eq!(content_type, "audio/wav");
        } else {
            assert_eq!(content_type, "text/plain");
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_failed_upload_retains_local_artifact() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed(&store, "g", "1000-alice.wav", b"audio")?;
    seed(&store, "g", "1000-alice.txt", b"text")?;

    // Audio uploads fine; the sidecar is rejected
    let uploader = Arc::new(FakeUploader::failing_on(".txt"));
    let uploader_dyn: Arc<dyn ArtifactUploader> = uploader.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), uploader_dyn);

    let report = runner.run("g", "c").await?;

    assert_eq!(report.uploaded, vec!["1000-alice.wav".to_string()]);
    assert_eq!(report.retained.len(), 1);
    assert_eq!(report.retained[0].file_name, "1000-alice.txt");

    let dir = store.session_dir("g");
    assert!(!dir.join("1000-alice.wav").exists(), "uploaded audio is deleted");
    assert!(dir.join("1000-alice.txt").exists(), "failed sidecar is retained");

    Ok(())
}

#[tokio::test]
async fn test_retry_after_partial_failure_is_idempotent_by_filename() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed(&store, "g", "1000-alice.wav", b"audio")?;
    seed(&store, "g", "1000-alice.txt", b"text")?;

    let failing = Arc::new(FakeUploader::failing_on(".txt"));
    let failing_dyn: Arc<dyn ArtifactUploader> = failing.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), failing_dyn);
    runner.run("g", "c").await?;

    // Next attempt with a healthy uploader picks up only what remains
    let healthy = Arc::new(FakeUploader::new());
    let healthy_dyn: Arc<dyn ArtifactUploader> = healthy.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), healthy_dyn);
    let report = runner.run("g", "c").await?;

    assert_eq!(report.uploaded, vec!["1000-alice.txt".to_string()]);
    assert!(report.retained.is_empty());
    assert_eq!(healthy.keys(), vec!["g/c/1000/1000-alice.txt".to_string()]);
    assert!(store.list_artifacts("g")?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_session_hands_off_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    let uploader = Arc::new(FakeUploader::new());
    let uploader_dyn: Arc<dyn ArtifactUploader> = uploader.clone();
    let runner = HandoffRunner::new(Arc::clone(&store), uploader_dyn);

    let report = runner.run("nothing-here", "c").await?;

    assert!(report.uploaded.is_empty());
    assert!(report.retained.is_empty());
    assert!(uploader.keys().is_empty());

    Ok(())
}
