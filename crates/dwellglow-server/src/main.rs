//! dwellglow service binary.
//!
//! Loads the receiver/light layout, starts the presence engine, and feeds
//! it events from either a UDP relay or a JSONL capture replay. Commands
//! go to the logging bridge; the real actuation transport is an external
//! collaborator wired in behind the same seam.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use dwellglow_core::{CoreError, GlowConfig};
use dwellglow_engine::{
    GlowEngine, ReplayEventReceiver, TracingLightBridge, UdpEventReceiver,
};

/// Ambient lighting driven by dwell-time popularity.
#[derive(Debug, Parser)]
#[command(name = "dwellglow", version)]
struct Args {
    /// Path to a JSON configuration file. Without one, a built-in
    /// two-light demo layout is used.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a JSONL event capture instead of listening for UDP events.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Playback speed multiplier for --replay (0 disables pacing).
    #[arg(long, default_value_t = 1.0)]
    playback_speed: f64,

    /// Loop the capture when it ends (with --replay).
    #[arg(long)]
    loop_playback: bool,

    /// Override the UDP bind address from the configuration.
    #[arg(long)]
    listen: Option<String>,
}

fn demo_config() -> GlowConfig {
    GlowConfig::builder()
        .receiver_light_pair("receiver-1", "light-1")
        .receiver_light_pair("receiver-2", "light-2")
        .build()
}

fn load_config(path: &Path) -> dwellglow_engine::Result<GlowConfig> {
    let text = std::fs::read_to_string(path)?;
    let config: GlowConfig = serde_json::from_str(&text).map_err(|error| {
        CoreError::configuration(format!("{}: {}", path.display(), error))
    })?;
    Ok(config)
}

async fn run_udp(engine: &GlowEngine, addr: &str) -> dwellglow_engine::Result<()> {
    let mut receiver = UdpEventReceiver::bind(addr).await?;

    loop {
        if let Some(event) = receiver.receive().await? {
            engine.process_event(&event);
        }
    }
}

async fn run_replay(
    engine: &GlowEngine,
    path: &Path,
    playback_speed: f64,
    loop_playback: bool,
) -> dwellglow_engine::Result<()> {
    let mut replay =
        ReplayEventReceiver::from_file(path)?.with_playback(playback_speed, loop_playback);

    while let Some(event) = replay.next_event().await {
        engine.process_event(&event);
    }

    tracing::info!("event capture exhausted");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("Error loading config: {error}");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("no config file given; using the built-in demo layout");
            demo_config()
        }
    };

    if let Some(listen) = &args.listen {
        config.event_bind_addr = listen.clone();
    }

    if !config.bridge_host.is_empty() {
        tracing::info!(
            bridge_host = %config.bridge_host,
            "light bridge collaborator configured; commands are logged locally"
        );
    }

    let mut engine = match GlowEngine::new(config) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    };
    engine.start(Arc::new(TracingLightBridge));

    let bind_addr = engine.config().event_bind_addr.clone();
    let feed = async {
        match &args.replay {
            Some(path) => {
                run_replay(&engine, path, args.playback_speed, args.loop_playback).await
            }
            None => run_udp(&engine, &bind_addr).await,
        }
    };

    tokio::select! {
        result = feed => match result {
            Ok(()) => {
                // Keep breathing on the final state until interrupted.
                tracing::info!("event feed ended; animation continues until ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "event feed failed");
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
        }
    }

    engine.stop();
}
