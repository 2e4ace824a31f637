//! chainpulse dashboard backend
//!
//! Runs the metric collector and the dashboard HTTP API in one process.

use chainpulse::api::{self, ApiServerConfig};
use chainpulse::clock::{Clock, SystemClock};
use chainpulse::collector::{seed_history, Collector, CollectorConfig};
use chainpulse::config::{ComponentFactory, SamplerConfig, SamplerKind};
use chainpulse::query::{ExpiringCache, MetricsQueryService, QueryConfig};
use chainpulse::telemetry::Telemetry;
use chainpulse::{Config, Error};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// chainpulse dashboard backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Milliseconds between sampling ticks
    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "15000")]
    poll_interval_ms: u64,

    /// Days of history kept by the retention sweep
    #[arg(long, env = "HISTORY_RETENTION_DAYS", default_value = "14")]
    history_retention_days: u32,

    /// JSON-RPC endpoint probed by the rpc sampler
    #[arg(long, env = "MONAD_RPC_URL", default_value = "https://rpc.monad.xyz")]
    rpc_url: String,

    /// Measurement source (synthetic, rpc)
    #[arg(long, env = "SAMPLER", default_value = "rpc")]
    sampler: String,

    /// Per-request timeout for the rpc sampler
    #[arg(long, env = "RPC_TIMEOUT_MS", default_value = "10000")]
    rpc_timeout_ms: u64,

    /// Allowed CORS origin
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    cors_origin: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Fill the store with a day of demo history before starting
    #[arg(long)]
    seed: bool,
}

impl Args {
    fn into_config(self) -> chainpulse::Result<Config> {
        let kind: SamplerKind = self.sampler.parse()?;
        let config = Config {
            query: QueryConfig::default(),
            collector: CollectorConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                retention_days: self.history_retention_days,
                ..Default::default()
            },
            sampler: SamplerConfig {
                kind,
                rpc_url: self.rpc_url,
                rpc_timeout: Duration::from_millis(self.rpc_timeout_ms),
            },
            api: ApiServerConfig {
                http_port: self.port,
                cors_origin: self.cors_origin,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("chainpulse", &args.log_level)?;

    info!("Starting chainpulse");

    let seed = args.seed;
    let config = args.into_config()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = ComponentFactory::create_store()?;
    let source = ComponentFactory::create_source(&config.sampler);

    if seed {
        let mut rng = StdRng::from_entropy();
        let report = seed_history(
            store.as_ref(),
            clock.now(),
            chrono::Duration::hours(24),
            chrono::Duration::minutes(30),
            &mut rng,
        )
        .await?;
        info!(
            points = report.points_inserted,
            snapshot = report.snapshot_inserted,
            "Seed complete"
        );
    }

    let cache = Arc::new(ExpiringCache::with_clock(
        config.query.default_ttl,
        Arc::clone(&clock),
    ));
    let query = Arc::new(MetricsQueryService::new(
        Arc::clone(&store),
        cache,
        Arc::clone(&clock),
        config.query.clone(),
    ));

    let collector = Arc::new(Collector::new(
        config.collector.clone(),
        store,
        source,
        clock,
    ));
    let collector_task = collector.spawn();

    let router = api::build_http_router(query, &config.api)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        http_port = config.api.http_port,
        sampler = %config.sampler.kind,
        poll_interval_ms = config.collector.poll_interval.as_millis() as u64,
        "HTTP server listening"
    );

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")));

    collector.stop();
    if let Err(e) = collector_task.await {
        error!(error = %e, "Collector task ended abnormally");
    }

    info!("chainpulse shutting down");
    served?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
