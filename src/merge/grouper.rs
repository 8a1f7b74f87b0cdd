use crate::store::ClosedSegment;

/// An ordered, non-empty run of same-speaker closed segments whose
/// consecutive creation-time gaps are all below the adjacency threshold.
#[derive(Debug, Clone)]
pub struct MergeGroup {
    pub segments: Vec<ClosedSegment>,
}

impl MergeGroup {
    /// The earliest segment; the merged artifact inherits its key.
    pub fn first(&self) -> &ClosedSegment {
        &self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A single-segment group passes through with no concatenation.
    pub fn is_trivial(&self) -> bool {
        self.segments.len() == 1
    }
}

/// Partition closed segments into maximal merge groups.
///
/// Segments are sorted ascending by creation time (speaker id as tiebreak),
/// then scanned once: a segment extends the current run iff it has the same
/// speaker as the previous segment AND the gap to it is below
/// `adjacency_threshold_ms`. Adjacency chains, so the greedy single pass
/// yields maximal runs regardless of the distance between a run's endpoints.
///
/// An empty input yields no groups; a lone segment yields one trivial group.
pub fn group_segments(
    mut segments: Vec<ClosedSegment>,
    adjacency_threshold_ms: i64,
) -> Vec<MergeGroup> {
    segments.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<MergeGroup> = Vec::new();

    for segment in segments {
        let extends_current = groups.last().is_some_and(|group| {
            let prev = &group.segments[group.segments.len() - 1].key;
            prev.speaker_id == segment.key.speaker_id
                && segment.key.created_at_ms - prev.created_at_ms < adjacency_threshold_ms
        });

        if extends_current {
            if let Some(group) = groups.last_mut() {
                group.segments.push(segment);
            }
        } else {
            groups.push(MergeGroup {
                segments: vec![segment],
            });
        }
    }

    groups
}
