use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::capture::{AudioFrame, FrameStream, SpeakingEvent, VoiceFrameSource};

use super::messages::{SpeakingEventMessage, VoiceFrameMessage};

/// NATS-backed voice frame source.
///
/// The voice gateway publishes speaking events on
/// `voice.speaking.{session}` and per-speaker frames on
/// `voice.frame.{session}.{speaker}`. Frames only flow while the speaker is
/// audible, so a subscription that sees nothing for the silence window is
/// over; a new subscription is a new sequence.
pub struct NatsFrameSource {
    client: Client,
    session_id: String,
}

impl NatsFrameSource {
    /// Connect to the NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    fn speaking_subject(&self) -> String {
        format!("voice.speaking.{}", self.session_id)
    }

    fn frame_subject(&self, speaker_id: &str) -> String {
        format!("voice.frame.{}.{}", self.session_id, speaker_id)
    }
}

#[async_trait::async_trait]
impl VoiceFrameSource for NatsFrameSource {
    async fn speaking_events(&self) -> Result<mpsc::Receiver<SpeakingEvent>> {
        let subject = self.speaking_subject();
        info!("Subscribing to speaking events on {}", subject);

        let mut subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to speaking events")?;

        let (tx, rx) = mpsc::channel(100);
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<SpeakingEventMessage>(&msg.payload) {
                    Ok(event) => {
                        if event.session_id != session_id {
                            continue;
                        }

                        let forwarded = tx
                            .send(SpeakingEvent {
                                speaker_id: event.speaker_id,
                                started: event.speaking,
                            })
                            .await;

                        if forwarded.is_err() {
                            break; // Session stopped listening
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse speaking event: {}", e);
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn subscribe(&self, speaker_id: &str, silence: Duration) -> Result<FrameStream> {
        let subject = self.frame_subject(speaker_id);

        let mut subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to speaker frames")?;

        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            loop {
                let message = match tokio::time::timeout(silence, subscriber.next()).await {
                    Err(_) => break,     // Silence window elapsed
                    Ok(None) => break,   // Subscription closed
                    Ok(Some(msg)) => msg,
                };

                let frame = match serde_json::from_slice::<VoiceFrameMessage>(&message.payload) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Failed to parse voice frame: {}", e);
                        continue;
                    }
                };

                if frame.final_frame {
                    break;
                }

                let pcm = match base64::engine::general_purpose::STANDARD.decode(&frame.pcm) {
                    Ok(pcm) => pcm,
                    Err(e) => {
                        warn!("Failed to decode PCM payload (seq {}): {}", frame.sequence, e);
                        continue;
                    }
                };

                let samples: Vec<i16> = pcm
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                    .collect();

                let forwarded = tx
                    .send(AudioFrame {
                        samples,
                        sample_rate: frame.sample_rate,
                        channels: frame.channels,
                    })
                    .await;

                if forwarded.is_err() {
                    break; // Capture side hung up
                }
            }

            if let Err(e) = subscriber.unsubscribe().await {
                warn!("Failed to unsubscribe speaker frames: {}", e);
            }
        });

        Ok(rx)
    }
}
