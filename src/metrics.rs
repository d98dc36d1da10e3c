use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the cache window.
    ///
    /// Fails if a recorder is already installed in this process.
    pub fn init(freshness_ms: u64) -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        // Static gauge with the configured freshness window
        gauge!("feed_cache_freshness_ms").set(freshness_ms as f64);
        crate::ingest::ensure_metrics_described();

        Ok(Self { handle })
    }

    /// Current exposition text for every `feed_*` series.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `/metrics` route serving the feed series in Prometheus text format:
    /// request outcomes (`feed_requests_total`), upstream health
    /// (`feed_fetch_errors_total`, `feed_items_fetched_total`, `feed_fetch_ms`)
    /// and cache gauges (`feed_cache_posts`, `feed_cache_last_refresh_ts`,
    /// `feed_cache_freshness_ms`).
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        )
    }
}
