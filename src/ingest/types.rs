// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::error::FetchError;

/// Anything that can produce the raw feed payload (HTTP proxy, fixture, test stub).
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedPayload, FetchError>;
    fn name(&self) -> &'static str;
}

/// One entry as returned by the feed-to-JSON proxy.
///
/// Built from any JSON value: fields with the wrong type are treated as absent,
/// so a single odd item never poisons the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub pub_date: Option<String>,
    pub link: Option<String>,
    pub thumbnail: Option<String>,
    pub enclosure_url: Option<String>,
    pub categories: Vec<String>,
}

impl RawFeedItem {
    /// Body used for every content-derived field: `content`, else `description`.
    pub fn body(&self) -> &str {
        match self.content.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => self.description.as_deref().unwrap_or_default(),
        }
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<Value> for RawFeedItem {
    fn from(v: Value) -> Self {
        // rss2json emits `enclosure.link`; plain RSS converters use `url`.
        let enclosure_url = v
            .get("enclosure")
            .and_then(|e| str_field(e, "link").or_else(|| str_field(e, "url")));

        let categories = v
            .get("categories")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: str_field(&v, "title"),
            description: str_field(&v, "description"),
            content: str_field(&v, "content"),
            pub_date: str_field(&v, "pubDate"),
            link: str_field(&v, "link"),
            thumbnail: str_field(&v, "thumbnail"),
            enclosure_url,
            categories,
        }
    }
}

/// Validated proxy response: an `items` array was present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPayload {
    pub items: Vec<RawFeedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Pulled from the external feed (local posts live outside this service).
    Syndicated,
}

/// Display-only estimates. Not measured, not reproducible across runs
/// unless the estimator rng is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    pub word_count: u64,
    pub estimated_views: u64,
    pub estimated_claps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPost {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub read_time: String,
    pub tags: Vec<String>,
    pub slug: String,
    pub image_url: String,
    pub source_url: String,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PostMetrics>,
}

/// Body returned by `GET /api/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsEnvelope {
    pub success: bool,
    pub posts: Vec<NormalizedPost>,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
