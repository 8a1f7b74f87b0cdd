use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// Remote transcription response: the text may be absent entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResponse {
    pub text: Option<String>,
}

impl TranscriptionResponse {
    /// Transcript text worth keeping, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Remote transcription seam: audio bytes in, optional text out.
///
/// The remote service governs its own rate and size limits; callers enforce
/// the submission budget defensively through [`super::RateLimiter`].
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<TranscriptionResponse>;
}

/// Whisper-style HTTP transcription client (multipart upload).
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpTranscriber {
    pub fn new(endpoint: impl Into<String>, api_key: &str, model: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid transcription API key")?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build transcription HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> Result<TranscriptionResponse> {
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")
            .context("Failed to build audio part")?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?
            .error_for_status()
            .context("Transcription service returned an error")?;

        response
            .json::<TranscriptionResponse>()
            .await
            .context("Failed to parse transcription response")
    }
}
