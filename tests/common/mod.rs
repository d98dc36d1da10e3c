// tests/common/mod.rs
// Shared helpers: a scripted feed source and raw item builders.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use syndication_service::ingest::error::FetchError;
use syndication_service::ingest::types::{FeedPayload, FeedSource, RawFeedItem};
use syndication_service::FeedConfig;

pub const FIXTURE_JSON: &str = include_str!("../fixtures/rss2json_feed.json");

/// Replays queued responses in order; once drained, every call fails.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<FeedPayload, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<FeedPayload, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self) -> Result<FeedPayload, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::UpstreamUnavailable("script exhausted".into())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn item(title: &str, content: &str) -> RawFeedItem {
    RawFeedItem {
        title: Some(title.to_string()),
        content: Some(content.to_string()),
        pub_date: Some("2025-01-01 00:00:00".to_string()),
        link: Some(format!("https://example.com/{}", title.to_lowercase())),
        ..Default::default()
    }
}

pub fn payload_of(n: usize) -> FeedPayload {
    FeedPayload {
        items: (0..n)
            .map(|i| item(&format!("Post {i}"), &format!("Body of post {i}. More text.")))
            .collect(),
    }
}

pub fn network_down() -> FetchError {
    FetchError::UpstreamUnavailable("connection refused".into())
}

/// Deterministic config: seeded estimator, default window.
pub fn seeded_config() -> FeedConfig {
    FeedConfig {
        metrics_seed: Some(42),
        ..FeedConfig::default()
    }
}
