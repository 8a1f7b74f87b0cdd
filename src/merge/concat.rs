use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Concatenator seam: joins an ordered list of container files into one.
///
/// Reports success or failure only; no partial-progress contract is assumed,
/// so callers treat any failure as "output unusable, inputs untouched".
#[async_trait::async_trait]
pub trait Concatenator: Send + Sync {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// Concatenation via an external ffmpeg process.
pub struct FfmpegConcatenator {
    program: String,
}

impl FfmpegConcatenator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl Concatenator for FfmpegConcatenator {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);

        for input in inputs {
            cmd.arg("-i").arg(input);
        }

        cmd.arg("-filter_complex")
            .arg(format!("concat=n={}:v=0:a=1", inputs.len()))
            .arg("-y")
            .arg(output);

        debug!("Running concatenation: {:?}", cmd);

        let result = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !result.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                String::from_utf8_lossy(&result.stderr)
            );
        }

        Ok(())
    }
}
