//! CountryCache server binary.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countrycache_engine::RefreshOrchestrator;
use countrycache_server::{build_router, AppState, ServerConfig};
use countrycache_sources::{build_client, ExchangeRateApiSource, RestCountriesSource};
use countrycache_store::{CountryStore, SqliteRepository};

/// CountryCache server CLI. Flags override environment variables.
#[derive(Parser, Debug)]
#[command(name = "countrycache")]
#[command(about = "Country data cache with exchange rates and GDP estimates")]
struct Args {
    /// Listen address
    #[arg(long)]
    listen_addr: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Refresh from upstream before serving
    #[arg(long)]
    refresh_on_startup: bool,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,

    /// Seed for GDP estimates, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if self.refresh_on_startup {
            config.refresh_on_startup = true;
        }
        if self.log_json {
            config.log_json = true;
        }
        if self.seed.is_some() {
            config.engine.rng_seed = self.seed;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    args.apply(&mut config);

    init_tracing(config.log_json);

    info!("Starting CountryCache server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let repository = Arc::new(SqliteRepository::connect(&config.database_url).await?);
    let store = Arc::new(CountryStore::open(repository).await?);

    let client = build_client(&config.sources)?;
    let countries = Arc::new(RestCountriesSource::new(
        client.clone(),
        config.sources.countries_url.clone(),
    ));
    let rates = Arc::new(ExchangeRateApiSource::new(
        client,
        config.sources.rates_url.clone(),
    ));

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        countries,
        rates,
        store,
        config.engine.clone(),
    ));

    if config.refresh_on_startup {
        match orchestrator.refresh().await {
            Ok(outcome) => info!(
                total_countries = outcome.refreshed_count,
                "Startup refresh complete"
            ),
            Err(e) => warn!(error = %e, "Startup refresh failed, serving cached data"),
        }
    }

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    let listener = TcpListener::bind(addr).await?;
    let app = build_router(AppState::new(orchestrator));

    info!(
        listen_addr = %addr,
        database_url = %config.database_url,
        "CountryCache server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("CountryCache server shutdown complete");
    Ok(())
}
