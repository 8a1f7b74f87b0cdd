//! Filesystem-backed segment store
//!
//! One directory per session, one file per capture segment. The filename is
//! the only index: `{created_at_ms}-{speaker}.wav`, with transcript sidecars
//! sharing the base name under a `.txt` extension. Directory listings must
//! stay sortable by the numeric prefix.

mod key;
mod store;

pub use key::{SegmentKey, AUDIO_EXT, TRANSCRIPT_EXT};
pub use store::{Artifact, ArtifactKind, ClosedSegment, OpenSegment, SegmentStore};
