// src/ingest/providers/rss2json.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::ingest::error::FetchError;
use crate::ingest::types::{FeedPayload, FeedSource, RawFeedItem};

const USER_AGENT: &str = concat!("syndication-service/", env!("CARGO_PKG_VERSION"));

/// Feed source backed by an rss2json-style conversion proxy.
///
/// Single attempt per call; failures bubble up as [`FetchError`] and the
/// caller decides how to degrade.
pub struct Rss2JsonProvider {
    mode: Mode,
}

enum Mode {
    /// JSON body held in memory; same validation as the HTTP path.
    Fixture(String),
    Http {
        client: reqwest::Client,
        proxy_endpoint: String,
        feed_url: String,
    },
}

impl Rss2JsonProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &FeedConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &cfg.proxy_endpoint, &cfg.feed_url))
    }

    pub fn with_client(client: reqwest::Client, proxy_endpoint: &str, feed_url: &str) -> Self {
        Self {
            mode: Mode::Http {
                client,
                proxy_endpoint: proxy_endpoint.to_string(),
                feed_url: feed_url.to_string(),
            },
        }
    }

    async fn fetch_http(
        client: &reqwest::Client,
        proxy_endpoint: &str,
        feed_url: &str,
    ) -> Result<FeedPayload, FetchError> {
        // `query` takes care of URL-encoding the feed address.
        let resp = client
            .get(proxy_endpoint)
            .query(&[("rss_url", feed_url)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "proxy responded with {status}"
            )));
        }

        let body = resp.bytes().await?;
        parse_payload(&body)
    }
}

/// Validate a proxy body: must be JSON with an array-typed `items`.
pub fn parse_payload(body: &[u8]) -> Result<FeedPayload, FetchError> {
    let v: Value = serde_json::from_slice(body)?;

    if v.get("status").and_then(Value::as_str) == Some("error") {
        let msg = v
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("proxy reported an error");
        return Err(FetchError::UpstreamUnavailable(msg.to_string()));
    }

    let items = match v.get("items") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(FetchError::MalformedPayload(
                "`items` is not an array".into(),
            ))
        }
        None => return Err(FetchError::MalformedPayload("missing `items`".into())),
    };

    Ok(FeedPayload {
        items: items.iter().cloned().map(RawFeedItem::from).collect(),
    })
}

#[async_trait]
impl FeedSource for Rss2JsonProvider {
    async fn fetch(&self) -> Result<FeedPayload, FetchError> {
        let t0 = std::time::Instant::now();
        let res = match &self.mode {
            Mode::Fixture(s) => parse_payload(s.as_bytes()),
            Mode::Http {
                client,
                proxy_endpoint,
                feed_url,
            } => Self::fetch_http(client, proxy_endpoint, feed_url).await,
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_fetch_ms").record(ms);

        match &res {
            Ok(payload) => {
                counter!("feed_items_fetched_total").increment(payload.items.len() as u64);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, kind = e.kind(), provider = self.name(), "feed fetch failed");
                counter!("feed_fetch_errors_total", "kind" => e.kind()).increment(1);
            }
        }
        res
    }

    fn name(&self) -> &'static str {
        "rss2json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_is_malformed() {
        let err = parse_payload(b"<rss></rss>").unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");
    }

    #[test]
    fn items_must_be_an_array() {
        let err = parse_payload(br#"{"items": {"title": "x"}}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));
        let err = parse_payload(br#"{"status": "ok"}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));
    }

    #[test]
    fn proxy_error_status_is_upstream() {
        let err =
            parse_payload(br#"{"status": "error", "message": "Cannot download this RSS feed"}"#)
                .unwrap_err();
        assert_eq!(
            err,
            FetchError::UpstreamUnavailable("Cannot download this RSS feed".into())
        );
    }

    #[test]
    fn empty_items_is_fine() {
        let p = parse_payload(br#"{"status": "ok", "items": []}"#).unwrap();
        assert!(p.items.is_empty());
    }
}
