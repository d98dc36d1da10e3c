// src/ingest/estimate.rs
//! Display-only engagement estimates.
//!
//! Nothing here is measured. Views are a function of length and age; claps
//! additionally draw a random rate, so two calls with the same inputs differ
//! unless the caller passes a seeded rng.

use chrono::{DateTime, NaiveDateTime};
use rand::Rng;

use crate::ingest::normalize::word_count;
use crate::ingest::types::PostMetrics;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const VIEW_BASE_CAP: u64 = 1000;
const MAX_TIME_MULTIPLIER: f64 = 2.0;
pub const CLAP_RATE_MIN: f64 = 0.05;
pub const CLAP_RATE_MAX: f64 = 0.15;

/// Best-effort parse of feed timestamps into epoch millis.
///
/// Accepts RFC 3339, RFC 2822 and rss2json's `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_published_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Whole days since publication, never below 1. Unknown dates count as 1.
pub fn age_days(published_at: &str, now_ms: i64) -> u64 {
    parse_published_ms(published_at)
        .map(|ms| now_ms.saturating_sub(ms).div_euclid(MS_PER_DAY))
        .map(|days| u64::try_from(days).unwrap_or(0))
        .unwrap_or(1)
        .max(1)
}

pub fn estimate<R: Rng + ?Sized>(
    content: &str,
    published_at: &str,
    now_ms: i64,
    rng: &mut R,
) -> PostMetrics {
    let words = word_count(content) as u64;
    let base = words.saturating_mul(2).min(VIEW_BASE_CAP);
    let multiplier = (age_days(published_at, now_ms) as f64 * 0.1).min(MAX_TIME_MULTIPLIER);
    let estimated_views = (base as f64 * multiplier).floor() as u64;

    let rate = rng.random_range(CLAP_RATE_MIN..=CLAP_RATE_MAX);
    let estimated_claps = (estimated_views as f64 * rate).floor() as u64;

    PostMetrics {
        word_count: words,
        estimated_views,
        estimated_claps,
    }
}
