use std::fmt;

/// Audio container extension for capture segments
pub const AUDIO_EXT: &str = "wav";

/// Sidecar transcript extension
pub const TRANSCRIPT_EXT: &str = "txt";

/// Storage key for one capture segment.
///
/// The key is embedded in the segment's filename and carries all segment
/// metadata: creation time (milliseconds since epoch) and speaker identity.
/// Ordering is creation time first, speaker id as tiebreak, which gives the
/// deterministic total order the merge grouper relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentKey {
    pub created_at_ms: i64,
    pub speaker_id: String,
}

impl SegmentKey {
    pub fn new(created_at_ms: i64, speaker_id: impl Into<String>) -> Self {
        Self {
            created_at_ms,
            speaker_id: speaker_id.into(),
        }
    }

    /// Filename of the audio artifact: `{created_at_ms}-{speaker}.wav`
    pub fn audio_file_name(&self) -> String {
        format!("{}-{}.{}", self.created_at_ms, self.speaker_id, AUDIO_EXT)
    }

    /// Filename of the transcript sidecar: `{created_at_ms}-{speaker}.txt`
    pub fn transcript_file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.created_at_ms, self.speaker_id, TRANSCRIPT_EXT
        )
    }

    /// Parse a key back out of an artifact filename.
    ///
    /// Returns `None` for filenames that don't follow the
    /// `{created_at_ms}-{speaker}.{ext}` layout; callers skip those.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.rsplit_once('.').map(|(stem, _)| stem)?;
        let (millis, speaker) = stem.split_once('-')?;

        if speaker.is_empty() {
            return None;
        }

        let created_at_ms: i64 = millis.parse().ok()?;
        Some(Self::new(created_at_ms, speaker))
    }

    /// Sanitize a raw speaker identity for filename use.
    ///
    /// The dash separates the timestamp prefix from the speaker id and the
    /// key must survive a filesystem round-trip, so anything outside
    /// `[A-Za-z0-9_.]` becomes an underscore.
    pub fn sanitize_speaker(raw: &str) -> String {
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.created_at_ms, self.speaker_id)
    }
}
