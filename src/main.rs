// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Host resource sampler binary.
//!
//! Thin bootstrap around [`os_probe::probe::OsProbe`]: samples on a fixed
//! cadence and prints one JSON snapshot per line until interrupted. The
//! library is the product; this loop exists for ad-hoc host inspection and
//! for wiring the probe under an external scheduler.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;

use os_probe::probe::OsProbe;

/// Host OS resource sampler
#[derive(Parser, Debug, Clone)]
#[command(name = "os-probe")]
#[command(about = "Sample host CPU, memory, swap, load and cgroup metrics as JSON lines")]
struct Args {
    /// Sampling interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    interval_ms: u64,

    /// Number of samples to emit before exiting (default: run until signalled)
    #[arg(short, long)]
    count: Option<u64>,

    /// Caller-allotted processor count reported in static info
    #[arg(long, env = "ALLOCATED_PROCESSORS")]
    allocated_processors: Option<usize>,

    /// Pretty-print each snapshot instead of emitting compact JSON lines
    #[arg(long, default_value = "false")]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - RUST_LOG takes precedence, fallback to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let run_id = Uuid::new_v4().to_string();
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!(
        run_id = %run_id,
        host = %host,
        interval_ms = args.interval_ms,
        count = ?args.count,
        "Starting os-probe"
    );

    run(args).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let probe = OsProbe::new();

    let allocated = args
        .allocated_processors
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from));
    let info = probe.static_info(args.interval_ms as i64, allocated);
    let info_json = serde_json::to_string(&info).context("failed to serialize static host info")?;
    tracing::info!(info = %info_json, "Static host info");

    let mut interval = tokio::time::interval(Duration::from_millis(args.interval_ms));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut emitted = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = probe.sample();
                let line = if args.pretty {
                    serde_json::to_string_pretty(&snapshot)
                } else {
                    serde_json::to_string(&snapshot)
                }
                .context("failed to serialize snapshot")?;
                println!("{line}");

                emitted += 1;
                if args.count.is_some_and(|count| emitted >= count) {
                    break;
                }
            }

            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, exiting sampler loop");
                break;
            }
        }
    }

    tracing::info!(samples = emitted, "Sampler finished");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            // SIGINT alone still provides a clean exit path.
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received interrupt, initiating graceful shutdown");
}
