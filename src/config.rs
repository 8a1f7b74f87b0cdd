use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureSettings,
    pub merge: MergeSettings,
    pub transcription: TranscriptionSettings,
    pub storage: StorageSettings,
    pub nats: NatsSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSettings {
    pub recordings_path: String,
    /// Continuous quiet ending a segment (milliseconds)
    pub silence_timeout_ms: u64,
    /// Hard cap on a single segment (seconds)
    pub segment_max_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct MergeSettings {
    /// Maximum same-speaker gap for two segments to merge (milliseconds)
    pub adjacency_threshold_ms: i64,
    /// Concurrent concatenation jobs
    pub max_concurrent: usize,
    /// Concatenator binary
    pub ffmpeg_program: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Submissions admitted per rolling window
    pub max_requests: usize,
    /// Rolling window length (seconds)
    pub window_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct NatsSettings {
    pub url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
