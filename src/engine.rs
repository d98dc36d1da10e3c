//! Ingestion engine: cache check -> fetch -> normalize/estimate -> store.
//!
//! Concurrent misses are not de-duplicated: each one refreshes on its own
//! and the last successful write wins.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::{CacheState, FeedCache};
use crate::config::FeedConfig;
use crate::ingest::normalize::Normalizer;
use crate::ingest::types::{FeedPayload, FeedSource, NormalizedPost, PostsEnvelope};
use crate::ingest::{build_posts, ensure_metrics_described};

pub const STALE_FALLBACK_MSG: &str = "Using cached data due to fetch error";
pub const FETCH_FAILED_MSG: &str = "Failed to fetch feed posts";

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct IngestionEngine {
    source: Arc<dyn FeedSource>,
    cache: FeedCache,
    normalizer: Normalizer,
    item_cap: usize,
    /// `None` disables the estimator entirely.
    rng: Option<Mutex<StdRng>>,
}

impl IngestionEngine {
    pub fn new(source: Arc<dyn FeedSource>, cfg: &FeedConfig) -> Self {
        let rng = cfg.estimate_metrics.then(|| {
            Mutex::new(match cfg.metrics_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            })
        });

        Self {
            source,
            cache: FeedCache::new(Duration::from_millis(cfg.freshness_ms)),
            normalizer: Normalizer::from_config(cfg),
            item_cap: cfg.item_cap,
            rng,
        }
    }

    /// Swap the normalizer (e.g. custom image matchers).
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn list_posts(&self) -> PostsEnvelope {
        self.list_posts_at(now_ms()).await
    }

    /// Same as [`list_posts`](Self::list_posts) with an explicit clock.
    pub async fn list_posts_at(&self, now_ms: i64) -> PostsEnvelope {
        ensure_metrics_described();

        if let Some(posts) = self.cache.fresh(now_ms) {
            tracing::debug!(target: "ingest", posts = posts.len(), "serving fresh cache");
            counter!("feed_requests_total", "outcome" => "fresh_cache").increment(1);
            return PostsEnvelope {
                success: true,
                posts,
                cached: true,
                error: None,
            };
        }

        match self.source.fetch().await {
            Ok(payload) => {
                let posts = self.normalize_all(&payload, now_ms);
                self.cache.store(posts.clone(), now_ms);

                counter!("feed_requests_total", "outcome" => "refreshed").increment(1);
                gauge!("feed_cache_posts").set(posts.len() as f64);
                gauge!("feed_cache_last_refresh_ts").set((now_ms / 1000) as f64);
                tracing::info!(
                    target: "ingest",
                    provider = self.source.name(),
                    raw = payload.items.len(),
                    kept = posts.len(),
                    "feed refreshed"
                );

                PostsEnvelope {
                    success: true,
                    posts,
                    cached: false,
                    error: None,
                }
            }
            Err(e) => match self.cache.stale() {
                Some(posts) => {
                    tracing::warn!(target: "ingest", error = %e, posts = posts.len(), "refresh failed, serving stale cache");
                    counter!("feed_requests_total", "outcome" => "stale_fallback").increment(1);
                    PostsEnvelope {
                        success: true,
                        posts,
                        cached: true,
                        error: Some(STALE_FALLBACK_MSG.to_string()),
                    }
                }
                None => {
                    tracing::warn!(target: "ingest", error = %e, "refresh failed with empty cache");
                    counter!("feed_requests_total", "outcome" => "failed").increment(1);
                    PostsEnvelope {
                        success: false,
                        posts: Vec::new(),
                        cached: false,
                        error: Some(FETCH_FAILED_MSG.to_string()),
                    }
                }
            },
        }
    }

    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    fn normalize_all(&self, payload: &FeedPayload, now_ms: i64) -> Vec<NormalizedPost> {
        match &self.rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(|p| p.into_inner());
                build_posts(
                    payload,
                    &self.normalizer,
                    self.item_cap,
                    now_ms,
                    Some(&mut *guard),
                )
            }
            None => build_posts::<StdRng>(payload, &self.normalizer, self.item_cap, now_ms, None),
        }
    }
}
