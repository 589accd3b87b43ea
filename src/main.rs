use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use opsmedic::config::Config;
use opsmedic::sample::MetricSample;
use opsmedic::simulate::{self, SimulatorOptions};

#[derive(Parser)]
#[command(
    name = "opsmedic",
    about = "Anomaly detection and rule-based remediation daemon for service metrics",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (ingest API + anomaly scorer + orchestrator)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// SQLite database path
        #[arg(long, default_value = "data/opsmedic.db")]
        db: String,

        /// TOML config file (defaults apply when missing)
        #[arg(long, default_value = "opsmedic.toml")]
        config: PathBuf,
    },

    /// Push a single metric sample to a running daemon
    Push {
        /// Daemon base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        #[arg(long)]
        cpu: f64,

        #[arg(long)]
        memory: f64,

        #[arg(long)]
        response_time: f64,

        #[arg(long)]
        error_rate: f64,

        #[arg(long)]
        rps: f64,
    },

    /// Feed a running daemon with synthetic metrics
    Simulate {
        /// Daemon base URL
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        /// Number of samples to send
        #[arg(long, default_value = "100")]
        count: usize,

        /// Milliseconds between samples
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Spike one field on every Nth sample (0 disables spikes)
        #[arg(long, default_value = "25")]
        spike_every: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db, config } => {
            tracing::info!(%bind, "Starting opsmedic daemon");
            let config = Config::load(&config)?;
            opsmedic::serve(&bind, &db, config).await?;
        }
        Commands::Push {
            endpoint,
            cpu,
            memory,
            response_time,
            error_rate,
            rps,
        } => {
            let sample = MetricSample {
                timestamp: chrono::Utc::now(),
                cpu_usage: cpu,
                memory_usage: memory,
                response_time_ms: response_time,
                error_rate_pct: error_rate,
                requests_per_sec: rps,
            };
            let client = reqwest::Client::new();
            let body = simulate::push_sample(&client, &endpoint, &sample).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Simulate {
            endpoint,
            count,
            interval_ms,
            spike_every,
        } => {
            tracing::info!(%endpoint, %count, "Starting metrics simulation");
            simulate::run(
                &endpoint,
                SimulatorOptions {
                    count,
                    interval: Duration::from_millis(interval_ms),
                    spike_every,
                },
            )
            .await?;
        }
    }

    Ok(())
}
