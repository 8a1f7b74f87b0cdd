use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::source::AudioFrame;

/// Writes one segment's frames to a container file.
///
/// `finish` must be called to produce a playable file; dropping an unfinished
/// writer finalizes best-effort so partial files stay readable for garbage
/// collection.
pub trait SegmentWriter: Send {
    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()>;
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Encoder seam: turns a raw frame stream into a finalized container file.
pub trait StreamEncoder: Send + Sync {
    fn begin(&self, path: &Path) -> Result<Box<dyn SegmentWriter>>;
}

/// WAV encoder backed by `hound`.
///
/// The WAV header needs the sample rate and channel count, which are only
/// known once the first frame arrives, so the underlying writer is created
/// lazily. A segment that never receives a frame produces no file.
pub struct WavStreamEncoder;

impl StreamEncoder for WavStreamEncoder {
    fn begin(&self, path: &Path) -> Result<Box<dyn SegmentWriter>> {
        Ok(Box::new(WavSegmentWriter {
            path: path.to_path_buf(),
            writer: None,
        }))
    }
}

struct WavSegmentWriter {
    path: PathBuf,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
}

impl SegmentWriter for WavSegmentWriter {
    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if self.writer.is_none() {
            let spec = hound::WavSpec {
                channels: frame.channels,
                sample_rate: frame.sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };

            let writer = hound::WavWriter::create(&self.path, spec)
                .with_context(|| format!("Failed to create WAV file: {:?}", self.path))?;
            self.writer = Some(writer);
        }

        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
        }

        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }
        Ok(())
    }
}

impl Drop for WavSegmentWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
