use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribed::capture::{CaptureConfig, WavStreamEncoder};
use scribed::handoff::{HandoffRunner, HttpUploader};
use scribed::merge::{FfmpegConcatenator, MergeExecutor};
use scribed::session::SessionProcessor;
use scribed::store::SegmentStore;
use scribed::transcribe::{HttpTranscriber, RateLimiter, TranscriptionQueue};
use scribed::{create_router, AppState, Config, SessionDeps};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "scribed", about = "Voice session recording and transcription service")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, default_value = "config/scribed")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Reprocess a session directory (merge, transcribe, hand off)
    Process {
        session_id: String,
        #[arg(long)]
        channel_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let store = Arc::new(SegmentStore::new(cfg.capture.recordings_path.clone()));
    let processor = build_processor(&cfg, Arc::clone(&store))?;

    match cli.command {
        Command::Serve => serve(cfg, store, processor).await,
        Command::Process {
            session_id,
            channel_id,
        } => {
            let report = processor.process(&session_id, &channel_id).await?;
            info!("Report: {}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn build_processor(cfg: &Config, store: Arc<SegmentStore>) -> Result<Arc<SessionProcessor>> {
    let concatenator = Arc::new(FfmpegConcatenator::new(cfg.merge.ffmpeg_program.clone()));
    let merge_executor = Arc::new(MergeExecutor::new(
        Arc::clone(&store),
        concatenator,
        cfg.merge.max_concurrent,
    ));

    let transcriber = Arc::new(HttpTranscriber::new(
        cfg.transcription.endpoint.clone(),
        &cfg.transcription.api_key,
        cfg.transcription.model.clone(),
    )?);
    let limiter = Arc::new(RateLimiter::new(
        cfg.transcription.max_requests,
        Duration::from_secs(cfg.transcription.window_secs),
    ));
    let transcription = Arc::new(TranscriptionQueue::new(
        Arc::clone(&store),
        transcriber,
        limiter,
    ));

    let uploader = Arc::new(HttpUploader::new(cfg.storage.endpoint.clone())?);
    let handoff = Arc::new(HandoffRunner::new(Arc::clone(&store), uploader));

    Ok(Arc::new(SessionProcessor::new(
        store,
        merge_executor,
        transcription,
        handoff,
        cfg.merge.adjacency_threshold_ms,
    )))
}

async fn serve(cfg: Config, store: Arc<SegmentStore>, processor: Arc<SessionProcessor>) -> Result<()> {
    let deps = Arc::new(SessionDeps {
        store,
        encoder: Arc::new(WavStreamEncoder),
        processor,
        capture_config: CaptureConfig {
            silence_timeout: Duration::from_millis(cfg.capture.silence_timeout_ms),
            segment_max: Duration::from_secs(cfg.capture.segment_max_secs),
        },
        nats_url: cfg.nats.url.clone(),
    });

    let router = create_router(AppState::new(deps));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server error")?;

    Ok(())
}
