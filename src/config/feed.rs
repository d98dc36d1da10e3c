// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_FEED_URL: &str = "FEED_URL";
pub const ENV_FRESHNESS_MS: &str = "FEED_FRESHNESS_MS";
pub const DEFAULT_CONFIG_PATH: &str = "config/feed.toml";

pub const DEFAULT_FEED_URL: &str = "https://medium.com/feed/@zachvarney";
pub const DEFAULT_PROXY_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";
pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=1200&h=630&fit=crop";

/// Vocabulary scanned (in this order) against post content when deriving tags.
pub const DEFAULT_TAG_VOCABULARY: &[&str] = &[
    "AI",
    "Machine Learning",
    "LLM",
    "Product Management",
    "Technology",
    "Innovation",
    "Data Science",
    "Automation",
];

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_proxy_endpoint() -> String {
    DEFAULT_PROXY_ENDPOINT.to_string()
}
fn default_freshness_ms() -> u64 {
    5 * 60 * 1000
}
fn default_item_cap() -> usize {
    10
}
fn default_fallback_image() -> String {
    DEFAULT_FALLBACK_IMAGE.to_string()
}
fn default_tag_vocabulary() -> Vec<String> {
    DEFAULT_TAG_VOCABULARY.iter().map(|s| s.to_string()).collect()
}
fn default_words_per_minute() -> usize {
    200
}
fn default_excerpt_max_chars() -> usize {
    200
}
fn default_max_tags() -> usize {
    5
}
fn default_category_tag_limit() -> usize {
    3
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed the conversion proxy is asked to fetch.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// rss2json-compatible endpoint; receives the feed as `?rss_url=`.
    #[serde(default = "default_proxy_endpoint")]
    pub proxy_endpoint: String,
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: u64,
    #[serde(default = "default_item_cap")]
    pub item_cap: usize,
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,
    #[serde(default = "default_tag_vocabulary")]
    pub tag_vocabulary: Vec<String>,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_category_tag_limit")]
    pub category_tag_limit: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Attach heuristic view/clap estimates to each post.
    #[serde(default = "default_true")]
    pub estimate_metrics: bool,
    /// Fixed seed for the estimator rng; OS entropy when absent.
    #[serde(default)]
    pub metrics_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            proxy_endpoint: default_proxy_endpoint(),
            freshness_ms: default_freshness_ms(),
            item_cap: default_item_cap(),
            fallback_image: default_fallback_image(),
            tag_vocabulary: default_tag_vocabulary(),
            words_per_minute: default_words_per_minute(),
            excerpt_max_chars: default_excerpt_max_chars(),
            max_tags: default_max_tags(),
            category_tag_limit: default_category_tag_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            estimate_metrics: true,
            metrics_seed: None,
        }
    }
}

impl FeedConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing feed config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(ENV_FEED_URL) {
            if !url.trim().is_empty() {
                cfg.feed_url = url.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_FRESHNESS_MS) {
            cfg.freshness_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FRESHNESS_MS} must be an integer, got {v:?}"))?;
        }

        Ok(cfg.sanitized())
    }

    /// Replace nonsensical values with defaults so downstream math stays total.
    pub fn sanitized(mut self) -> Self {
        if self.freshness_ms == 0 {
            self.freshness_ms = default_freshness_ms();
        }
        if self.item_cap == 0 {
            self.item_cap = default_item_cap();
        }
        if self.words_per_minute == 0 {
            self.words_per_minute = default_words_per_minute();
        }
        if self.excerpt_max_chars == 0 {
            self.excerpt_max_chars = default_excerpt_max_chars();
        }
        if self.max_tags == 0 {
            self.max_tags = default_max_tags();
        }
        self.category_tag_limit = self.category_tag_limit.min(self.max_tags);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if !is_absolute_http_url(&self.fallback_image) {
            self.fallback_image = default_fallback_image();
        }
        self.tag_vocabulary.retain(|t| !t.trim().is_empty());
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str(s) {
        Ok(cfg) => Ok(cfg),
        // Unknown extension: give JSON a chance before failing.
        Err(e) if hint_ext != "toml" => serde_json::from_str(s).map_err(|_| anyhow!(e)),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn is_absolute_http_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
