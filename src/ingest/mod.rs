// src/ingest/mod.rs
pub mod error;
pub mod estimate;
pub mod normalize;
pub mod providers;
pub mod types;

use crate::ingest::normalize::Normalizer;
use crate::ingest::types::{FeedPayload, NormalizedPost};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use rand::Rng;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feed_requests_total",
            "Post list requests by outcome (fresh_cache, refreshed, stale_fallback, failed)."
        );
        describe_counter!(
            "feed_fetch_errors_total",
            "Upstream fetch failures by kind."
        );
        describe_counter!(
            "feed_items_fetched_total",
            "Raw items returned by the conversion proxy."
        );
        describe_histogram!("feed_fetch_ms", "Upstream fetch + parse time in milliseconds.");
        describe_gauge!("feed_cache_posts", "Posts held by the cache after the last refresh.");
        describe_gauge!(
            "feed_cache_last_refresh_ts",
            "Unix ts of the last successful refresh."
        );
    });
}

/// Normalize the first `item_cap` items in feed order.
///
/// With `rng` present each post also gets heuristic metrics; without it
/// `metrics` stays `None`.
pub fn build_posts<R: Rng + ?Sized>(
    payload: &FeedPayload,
    normalizer: &Normalizer,
    item_cap: usize,
    now_ms: i64,
    mut rng: Option<&mut R>,
) -> Vec<NormalizedPost> {
    payload
        .items
        .iter()
        .take(item_cap)
        .map(|item| {
            let mut post = normalizer.normalize(item, now_ms);
            if let Some(rng) = rng.as_deref_mut() {
                post.metrics = Some(estimate::estimate(
                    item.body(),
                    &post.published_at,
                    now_ms,
                    rng,
                ));
            }
            post
        })
        .collect()
}
