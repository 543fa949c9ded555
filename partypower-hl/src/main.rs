//! partypower-hl - session highlight analysis
//!
//! Runs one analysis over a captured session directory (sensor log plus
//! audio segments) and writes the highlight report as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use partypower_common::config::load_config;
use partypower_common::events::{AnalysisEvent, EventBus};
use partypower_hl::services::HttpRecognizer;
use partypower_hl::{AnalysisError, HighlightPipeline, SessionInputs};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for partypower-hl
#[derive(Parser, Debug)]
#[command(name = "partypower-hl")]
#[command(about = "Find highlight moments in a captured party session")]
#[command(version)]
struct Args {
    /// Session directory containing the sensor log and audio segments
    session_dir: PathBuf,

    /// Configuration file (overrides PARTYPOWER_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report output path (default: <SESSION_DIR>/highlights.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also export the merged session audio as WAV
    #[arg(long, env = "PARTYPOWER_MERGED_AUDIO")]
    merged_audio: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting partypower-hl v{}", env!("CARGO_PKG_VERSION"));
    info!("Session: {}", args.session_dir.display());

    let inputs = SessionInputs::discover(&args.session_dir)
        .with_context(|| format!("Failed to read session {}", args.session_dir.display()))?;

    let recognizer =
        HttpRecognizer::new(&config.recognizer).context("Failed to create recognizer client")?;

    let event_bus = EventBus::new(100);
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AnalysisEvent::RecognitionProgress { completed, total, .. } => {
                    info!("Recognition {}/{}", completed, total);
                }
                other => debug!(event = ?other, "Analysis event"),
            }
        }
    });

    let pipeline = HighlightPipeline::new(config.analysis.clone(), Arc::new(recognizer))
        .context("Invalid analysis parameters")?
        .with_max_concurrency(config.recognizer.max_concurrency)
        .with_events(event_bus);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current candidate");
            ctrl_c_token.cancel();
        }
    });

    let report = match pipeline
        .run_session(&inputs, args.merged_audio.as_deref(), &cancel)
        .await
    {
        Ok(report) => report,
        Err(AnalysisError::Cancelled) => {
            info!("Analysis cancelled, no report written");
            return Ok(());
        }
        Err(e) => return Err(e).context("Analysis failed"),
    };

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    let output = args
        .output
        .unwrap_or_else(|| args.session_dir.join("highlights.json"));
    report
        .write_json(&output)
        .with_context(|| format!("Failed to write report {}", output.display()))?;

    info!(
        moments = report.moments.len(),
        "Report written to {}",
        output.display()
    );
    for record in report.display_order() {
        info!(
            "{:>8.1}s  {} - {} (score {:.2}, {} bpm)",
            record.timestamp, record.title, record.artist, record.score, record.user_bpm
        );
    }

    Ok(())
}
