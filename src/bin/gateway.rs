//! Touchline gateway server.
//!
//! Loads configuration (optional TOML file, then environment), starts the
//! HTTP endpoint and serves until Ctrl-C. Logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use touchline::GatewayConfig;
use tracing_subscriber::EnvFilter;

/// How long to wait for queued history writes on shutdown.
const HISTORY_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Football search gateway: web search plus LLM summaries behind one endpoint.
#[derive(Parser)]
#[command(name = "touchline-gateway", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port (0 picks a free port).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the effective configuration (secrets redacted) and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("touchline=info,touchline_search=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let mode = touchline::ResolutionMode::from_config(&config)?;
    if cli.check {
        println!("mode: {mode}");
        if let Some(search) = config.search.as_ref().filter(|_| mode.uses_search()) {
            println!("search: {} (max {} results)", search.provider, search.max_results);
        }
        if let Some(generation) = config.generation.as_ref().filter(|_| mode.uses_generation()) {
            println!("generation: {} ({})", generation.provider, generation.effective_model());
        }
        println!("{config:#?}");
        return Ok(());
    }

    let running = touchline::launch(&config).await.map_err(|e| {
        tracing::error!(error = %e, "gateway failed to start");
        anyhow::anyhow!("touchline-gateway failed: {e}")
    })?;
    tracing::info!("serving on http://{}", running.addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    match tokio::time::timeout(HISTORY_DRAIN_GRACE, running.shutdown()).await {
        Ok(processed) => tracing::info!(processed, "history drained"),
        Err(_) => tracing::warn!("history drain timed out; pending records dropped"),
    }
    Ok(())
}
