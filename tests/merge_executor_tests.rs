// Tests for the bounded merge executor: concurrency ceiling, per-group
// failure isolation, and pass-through of trivial groups.

use anyhow::{bail, Result};
use scribed::merge::{group_segments, Concatenator, MergeExecutor, MergeOutcome};
use scribed::store::SegmentStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Concatenator fake: tracks in-flight jobs, optionally fails on selected
/// outputs, and simulates merging by concatenating the input bytes.
struct FakeConcatenator {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    invocations: AtomicUsize,
    fail_outputs_containing: Option<&'static str>,
    delay: Duration,
}

impl FakeConcatenator {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
            fail_outputs_containing: None,
            delay: Duration::from_millis(0),
        }
    }

    fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_outputs_containing: Some(marker),
            ..Self::new()
        }
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }
}

#[async_trait::async_trait]
impl Concatenator for FakeConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(marker) = self.fail_outputs_containing {
            if output.to_string_lossy().contains(marker) {
                bail!("simulated concatenation failure");
            }
        }

        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(fs::read(input)?);
        }
        fs::write(output, merged)?;

        Ok(())
    }
}

fn seed_segment(store: &SegmentStore, session: &str, ms: i64, speaker: &str, data: &[u8]) -> Result<()> {
    let dir = store.session_dir(session);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{}-{}.wav", ms, speaker)), data)?;
    Ok(())
}

#[tokio::test]
async fn test_merged_group_replaces_originals_with_first_key() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed_segment(&store, "s1", 1000, "alice", b"one")?;
    seed_segment(&store, "s1", 1200, "alice", b"two")?;
    seed_segment(&store, "s1", 1400, "alice", b"three")?;

    let concatenator = Arc::new(FakeConcatenator::new());
    let executor = MergeExecutor::new(Arc::clone(&store), concatenator, 5);

    let groups = group_segments(store.list_closed("s1")?, 1_000);
    assert_eq!(groups.len(), 1);

    let outcomes = executor.execute("s1", groups).await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0],
        MergeOutcome::Merged { source_count: 3, .. }
    ));

    // One surviving segment, carrying the first constituent's key
    let remaining = store.list_closed("s1")?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key.created_at_ms, 1000);
    assert_eq!(remaining[0].key.speaker_id, "alice");
    assert_eq!(fs::read(&remaining[0].path)?, b"onetwothree");

    Ok(())
}

#[tokio::test]
async fn test_trivial_groups_pass_through_without_concatenation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    seed_segment(&store, "s1", 1000, "alice", b"solo")?;

    let concatenator = Arc::new(FakeConcatenator::new());
    let concatenator_dyn: Arc<dyn Concatenator> = concatenator.clone();
    let executor = MergeExecutor::new(Arc::clone(&store), concatenator_dyn, 5);

    let groups = group_segments(store.list_closed("s1")?, 1_000);
    let outcomes = executor.execute("s1", groups).await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], MergeOutcome::PassThrough { .. }));
    assert_eq!(concatenator.invocations.load(Ordering::SeqCst), 0);

    let remaining = store.list_closed("s1")?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(fs::read(&remaining[0].path)?, b"solo");

    Ok(())
}

#[tokio::test]
async fn test_one_failing_group_does_not_block_siblings() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    // Two mergeable groups: alice fails, bob succeeds
    seed_segment(&store, "s1", 1000, "alice", b"a1")?;
    seed_segment(&store, "s1", 1100, "alice", b"a2")?;
    seed_segment(&store, "s1", 5000, "bob", b"b1")?;
    seed_segment(&store, "s1", 5100, "bob", b"b2")?;

    let concatenator = Arc::new(FakeConcatenator::failing_on("alice"));
    let executor = MergeExecutor::new(Arc::clone(&store), concatenator, 5);

    let groups = group_segments(store.list_closed("s1")?, 1_000);
    assert_eq!(groups.len(), 2);

    let outcomes = executor.execute("s1", groups).await;

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, MergeOutcome::Failed { .. }))
        .count();
    let merged = outcomes
        .iter()
        .filter(|o| matches!(o, MergeOutcome::Merged { .. }))
        .count();
    assert_eq!((failed, merged), (1, 1));

    let remaining = store.list_closed("s1")?;

    // Alice's originals are untouched; bob's were merged into one
    let alice: Vec<_> = remaining
        .iter()
        .filter(|s| s.key.speaker_id == "alice")
        .collect();
    let bob: Vec<_> = remaining
        .iter()
        .filter(|s| s.key.speaker_id == "bob")
        .collect();

    assert_eq!(alice.len(), 2);
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].key.created_at_ms, 5000);
    assert_eq!(fs::read(&bob[0].path)?, b"b1b2");

    // No stale staging output left behind for the failed group
    let staging = store.staging_dir("s1");
    if staging.exists() {
        assert_eq!(fs::read_dir(&staging)?.count(), 0);
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_never_exceeds_the_ceiling() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SegmentStore::new(temp_dir.path()));

    // Eight mergeable groups, far apart so they never chain
    for i in 0..8 {
        let base = i as i64 * 100_000;
        seed_segment(&store, "s1", base, "alice", b"x")?;
        seed_segment(&store, "s1", base + 100, "alice", b"y")?;
    }

    let concatenator = Arc::new(FakeConcatenator::with_delay(Duration::from_millis(50)));
    let concatenator_dyn: Arc<dyn Concatenator> = concatenator.clone();
    let executor = MergeExecutor::new(Arc::clone(&store), concatenator_dyn, 3);

    let groups = group_segments(store.list_closed("s1")?, 1_000);
    assert_eq!(groups.len(), 8);

    let outcomes = executor.execute("s1", groups).await;

    assert_eq!(outcomes.len(), 8);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, MergeOutcome::Merged { .. })));
    assert!(
        concatenator.max_in_flight.load(Ordering::SeqCst) <= 3,
        "saw {} concurrent jobs with a ceiling of 3",
        concatenator.max_in_flight.load(Ordering::SeqCst)
    );

    Ok(())
}
