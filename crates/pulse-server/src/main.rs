//! Pulse monitor server.
//!
//! Reads a MAX30100 pulse oximeter and a DHT11 sensor on request, drives a
//! buzzer when vitals leave the configured band, and serves the reading
//! as HTML (`/`) and JSON (`/api/data`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pulse_server::api::{create_router, AppState};
use pulse_server::{BusyPolicy, HardwareContext, MonitorConfig, VitalsMonitor};
use pulse_vitals::{AlertPolicy, EstimationStrategy};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pulse-server", version, about = "Pulse oximetry and temperature monitor")]
struct Args {
    /// HTTP port for the dashboard and JSON API
    #[arg(long, default_value = "5000")]
    http_port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: std::net::IpAddr,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use simulated sensors instead of hardware
    #[arg(long)]
    simulate: bool,

    /// Estimation strategy (also selects the matching acquisition plan)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Alert band
    #[arg(long, value_enum)]
    alert_policy: Option<AlertPolicyArg>,

    /// Answer 503 instead of queueing when a read is already running
    #[arg(long)]
    reject_when_busy: bool,

    /// Directory served under /static
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StrategyArg {
    Ratio,
    PeakCount,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AlertPolicyArg {
    Tight,
    Clinical,
}

impl Args {
    fn effective_config(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_json(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => MonitorConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config = config.with_strategy(match strategy {
                StrategyArg::Ratio => EstimationStrategy::ratio(),
                StrategyArg::PeakCount => EstimationStrategy::peak_count(),
            });
        }
        if let Some(policy) = self.alert_policy {
            config.alert_policy = match policy {
                AlertPolicyArg::Tight => AlertPolicy::Tight,
                AlertPolicyArg::Clinical => AlertPolicy::Clinical,
            };
        }
        if self.simulate {
            config.simulate = true;
        }
        if self.reject_when_busy {
            config.busy_policy = BusyPolicy::Reject;
        }

        config.validate()?;
        Ok(config)
    }
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = args.effective_config()?;

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    info!(
        strategy = config.strategy.name(),
        alert_policy = config.alert_policy.name(),
        busy_policy = ?config.busy_policy,
        simulate = config.simulate,
        "starting pulse monitor"
    );

    let mut hardware = HardwareContext::from_config(&config);
    hardware.park();

    let monitor = Arc::new(VitalsMonitor::new(hardware, &config));
    let state = AppState::new(Arc::clone(&monitor), config.busy_policy);
    let app = create_router(state, args.static_dir.clone());

    let addr = SocketAddr::new(args.bind, args.http_port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    // A cycle may still be running on the blocking pool; shutdown waits for it.
    tokio::task::spawn_blocking(move || monitor.shutdown())
        .await
        .context("parking hardware")?;
    info!("Server shut down cleanly");
    Ok(())
}
