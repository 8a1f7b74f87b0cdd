// End-to-end test of the post-capture pipeline: group → merge →
// transcribe → handoff, with all collaborators faked.

use anyhow::Result;
use scribed::handoff::{ArtifactUploader, HandoffRunner};
use scribed::merge::{Concatenator, MergeExecutor};
use scribed::session::SessionProcessor;
use scribed::store::SegmentStore;
use scribed::transcribe::{RateLimiter, Transcriber, TranscriptionQueue, TranscriptionResponse};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

struct ByteConcatenator;

#[async_trait::async_trait]
impl Concatenator for ByteConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(fs::read(input)?);
        }
        fs::write(output, merged)?;
        Ok(())
    }
}

struct EchoTranscriber;

#[async_trait::async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, file_name: &str, _audio: Vec<u8>) -> Result<TranscriptionResponse> {
        Ok(TranscriptionResponse {
            text: Some(format!("transcript of {}", file_name)),
        })
    }
}

struct CollectingUploader {
    keys: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ArtifactUploader for CollectingUploader {
    async fn put(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        self.keys.lock().expect("keys lock").push(key.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_full_pipeline_leaves_only_uploaded_transcripts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    // Alice's utterance split by the hard cap, plus one from bob
    let dir = store.session_dir("guild-1");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("1000-alice.wav"), b"a1")?;
    fs::write(dir.join("1500-alice.wav"), b"a2")?;
    fs::write(dir.join("90000-bob.wav"), b"b1")?;

    let merge_executor = Arc::new(MergeExecutor::new(
        Arc::clone(&store),
        Arc::new(ByteConcatenator),
        5,
    ));
    let transcription = Arc::new(TranscriptionQueue::new(
        Arc::clone(&store),
        Arc::new(EchoTranscriber),
        Arc::new(RateLimiter::new(50, Duration::from_secs(60))),
    ));
    let uploader = Arc::new(CollectingUploader {
        keys: Mutex::new(Vec::new()),
    });
    let uploader_dyn: Arc<dyn ArtifactUploader> = uploader.clone();
    let handoff = Arc::new(HandoffRunner::new(
        Arc::clone(&store),
        uploader_dyn,
    ));

    let processor = SessionProcessor::new(
        Arc::clone(&store),
        merge_executor,
        transcription,
        handoff,
        1_000,
    );

    let report = processor.process("guild-1", "voice-chan").await?;

    assert_eq!(report.segments, 3);
    assert_eq!(report.merge_groups, 2); // [alice pair], [bob]
    assert_eq!(report.merge_failures, 0);
    assert_eq!(report.transcribed, 2); // merged alice + bob
    assert_eq!(report.discarded, 0);
    assert_eq!(report.uploaded, 2); // two transcript sidecars
    assert!(report.retained.is_empty());

    // The local store is fully drained
    assert!(store.list_artifacts("guild-1")?.is_empty());

    // Transcripts were bucketed under the earliest surviving timestamp and
    // named after the merged segments
    let mut keys = uploader.keys.lock().expect("keys lock").clone();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "guild-1/voice-chan/1000/1000-alice.txt".to_string(),
            "guild-1/voice-chan/1000/90000-bob.txt".to_string(),
        ]
    );

    Ok(())
}
