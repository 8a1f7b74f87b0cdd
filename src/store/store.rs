use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::key::{SegmentKey, AUDIO_EXT, TRANSCRIPT_EXT};

/// Suffix for segments still being written
const OPEN_SUFFIX: &str = "part";

/// A segment that has been allocated but is still being written.
///
/// The writer targets `part_path`; promoting renames it to `final_path`,
/// which is the open → closed transition.
#[derive(Debug, Clone)]
pub struct OpenSegment {
    pub key: SegmentKey,
    pub part_path: PathBuf,
    pub final_path: PathBuf,
}

/// A finalized segment, eligible for merge and transcription.
#[derive(Debug, Clone)]
pub struct ClosedSegment {
    pub key: SegmentKey,
    pub path: PathBuf,
}

/// Artifact kind left in a session directory after processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    Transcript,
}

impl ArtifactKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio/wav",
            ArtifactKind::Transcript => "text/plain",
        }
    }
}

/// A remaining artifact (audio or transcript sidecar) at handoff time
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: SegmentKey,
    pub kind: ArtifactKind,
    pub file_name: String,
    pub path: PathBuf,
}

/// Filesystem-backed segment store
///
/// All state transitions are file operations: create, rename, delete. No
/// in-memory index exists; listings re-read the directory every time, which
/// keeps the store crash-recoverable.
pub struct SegmentStore {
    root: PathBuf,
}

impl SegmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one session's segments
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    /// Staging directory for in-progress merge outputs
    pub fn staging_dir(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join("merged")
    }

    /// Allocate a new open segment for a speaker.
    ///
    /// Creates the session directory lazily. The creation timestamp is taken
    /// at allocation time; if the resulting filename already exists (two
    /// opens for one speaker within the same millisecond), the timestamp is
    /// bumped until the key is free so keys stay unique.
    pub fn open_segment(&self, session_id: &str, speaker_id: &str) -> Result<OpenSegment> {
        let dir = self.session_dir(session_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {:?}", dir))?;

        let speaker = SegmentKey::sanitize_speaker(speaker_id);
        let mut created_at_ms = Utc::now().timestamp_millis();

        loop {
            let key = SegmentKey::new(created_at_ms, speaker.clone());
            let final_path = dir.join(key.audio_file_name());
            let part_path = dir.join(format!("{}.{}", key.audio_file_name(), OPEN_SUFFIX));

            if !final_path.exists() && !part_path.exists() {
                info!("Opened segment {}", key);
                return Ok(OpenSegment {
                    key,
                    part_path,
                    final_path,
                });
            }

            created_at_ms += 1;
        }
    }

    /// Promote an open segment to closed (finalized, eligible for merge).
    pub fn promote(&self, open: &OpenSegment) -> Result<ClosedSegment> {
        fs::rename(&open.part_path, &open.final_path).with_context(|| {
            format!(
                "Failed to finalize segment {:?} -> {:?}",
                open.part_path, open.final_path
            )
        })?;

        info!("Closed segment {}", open.key);

        Ok(ClosedSegment {
            key: open.key.clone(),
            path: open.final_path.clone(),
        })
    }

    /// Abandon an open segment, deleting the partial file if one was written.
    ///
    /// Best-effort: a leftover partial is garbage, not state, and is never
    /// picked up by listings.
    pub fn abandon(&self, open: &OpenSegment) {
        if open.part_path.exists() {
            if let Err(e) = fs::remove_file(&open.part_path) {
                warn!("Failed to delete abandoned segment {}: {}", open.key, e);
            }
        }
    }

    /// List all closed audio segments for a session, sorted by creation time
    /// (speaker id as tiebreak).
    ///
    /// A missing session directory is an empty session, not an error.
    pub fn list_closed(&self, session_id: &str) -> Result<Vec<ClosedSegment>> {
        let mut segments: Vec<ClosedSegment> = self
            .list_files_with_ext(session_id, AUDIO_EXT)?
            .into_iter()
            .map(|(key, path)| ClosedSegment { key, path })
            .collect();

        segments.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(segments)
    }

    /// List every remaining artifact (audio and transcript) for a session,
    /// sorted by creation time.
    pub fn list_artifacts(&self, session_id: &str) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();

        for (kind, ext) in [
            (ArtifactKind::Audio, AUDIO_EXT),
            (ArtifactKind::Transcript, TRANSCRIPT_EXT),
        ] {
            for (key, path) in self.list_files_with_ext(session_id, ext)? {
                let file_name = match path.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                };
                artifacts.push(Artifact {
                    key,
                    kind,
                    file_name,
                    path,
                });
            }
        }

        artifacts.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(artifacts)
    }

    /// Path of the transcript sidecar for a segment
    pub fn transcript_path(&self, session_id: &str, key: &SegmentKey) -> PathBuf {
        self.session_dir(session_id).join(key.transcript_file_name())
    }

    /// Delete an artifact file
    pub fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("Failed to delete {:?}", path))
    }

    fn list_files_with_ext(&self, session_id: &str, ext: &str) -> Result<Vec<(SegmentKey, PathBuf)>> {
        let dir = self.session_dir(session_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read session directory {:?}", dir))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match SegmentKey::parse(file_name) {
                Some(key) => files.push((key, path)),
                None => warn!("Skipping unrecognized file in session store: {}", file_name),
            }
        }

        Ok(files)
    }
}
