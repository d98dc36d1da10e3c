// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::{CacheState, FeedCache};
pub use crate::config::FeedConfig;
pub use crate::engine::IngestionEngine;
pub use crate::ingest::types::{NormalizedPost, PostsEnvelope};

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use crate::ingest::providers::rss2json::Rss2JsonProvider;

/// Build the HTTP app for `cfg` against the real conversion proxy.
pub fn app_with_config(cfg: &FeedConfig) -> anyhow::Result<Router> {
    let provider = Rss2JsonProvider::from_config(cfg).context("building feed http client")?;
    let engine = IngestionEngine::new(Arc::new(provider), cfg);
    tracing::info!(
        feed = %cfg.feed_url,
        proxy = %cfg.proxy_endpoint,
        freshness_ms = cfg.freshness_ms,
        item_cap = cfg.item_cap,
        "feed ingestion configured"
    );
    Ok(router(AppState::new(engine)))
}

/// Same as [`app_with_config`], loading config from env / `config/feed.toml`.
pub fn app() -> anyhow::Result<Router> {
    let cfg = FeedConfig::load_default()?;
    app_with_config(&cfg)
}
