//! Syndication Service — Binary Entrypoint
//! Boots the Axum HTTP server with the feed ingestion engine and `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use syndication_service::metrics::Metrics;
use syndication_service::{app_with_config, FeedConfig};

/// Install a tracing subscriber unless the runtime already did.
///
/// `RUST_LOG` drives filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("syndication_service=info,ingest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed; keeping it");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::load_default()?;

    let metrics = Metrics::init(cfg.freshness_ms).map_err(anyhow::Error::from)?;

    let app = app_with_config(&cfg)?.merge(metrics.router());
    tracing::info!(estimate_metrics = cfg.estimate_metrics, "starting syndication service");
    Ok(app.into())
}
