// tests/providers_rss2json.rs
//
// Feed fetcher against the bundled fixture and against a throwaway local
// upstream bound to 127.0.0.1:0 (no external network).

mod common;

use std::collections::HashMap;

use axum::{extract::Query, routing::get, Router};
use common::FIXTURE_JSON;
use http::StatusCode;
use syndication_service::ingest::error::FetchError;
use syndication_service::ingest::normalize::Normalizer;
use syndication_service::ingest::providers::rss2json::Rss2JsonProvider;
use syndication_service::ingest::types::FeedSource;

const FEED: &str = "https://medium.com/feed/@zachvarney";

/// Serve `app` on an ephemeral port and return its base URL.
async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });
    format!("http://{addr}/v1/api.json")
}

fn provider_for(endpoint: &str) -> Rss2JsonProvider {
    Rss2JsonProvider::with_client(reqwest::Client::new(), endpoint, FEED)
}

#[tokio::test]
async fn fixture_parses_all_items() {
    let provider = Rss2JsonProvider::from_fixture_str(FIXTURE_JSON);
    let payload = provider.fetch().await.expect("fixture parse ok");
    assert_eq!(payload.items.len(), 3);

    let first = &payload.items[0];
    assert_eq!(
        first.title.as_deref(),
        Some("Shifting from Hype to Shipping: AI Agents!")
    );
    assert_eq!(first.thumbnail, None, "empty strings count as absent");
    assert_eq!(first.categories.len(), 4);
}

#[tokio::test]
async fn fixture_items_normalize_as_expected() {
    let provider = Rss2JsonProvider::from_fixture_str(FIXTURE_JSON);
    let payload = provider.fetch().await.unwrap();
    let n = Normalizer::default();

    let p0 = n.normalize(&payload.items[0], 0);
    assert_eq!(p0.slug, "shifting-from-hype-to-shipping-ai-agents");
    assert_eq!(
        p0.image_url,
        "https://cdn-images-1.medium.com/max/1200/1*hero.png"
    );
    assert_eq!(
        p0.description,
        "Most teams talk about AI agents long before they ship one."
    );
    assert_eq!(
        p0.tags,
        vec!["ai-agents", "product-management", "llm", "AI", "LLM"]
    );
    assert_eq!(p0.published_at, "2025-03-10 14:22:05");

    let p1 = n.normalize(&payload.items[1], 0);
    assert_eq!(
        p1.image_url,
        "https://miro.medium.com/v2/resize:fit:1200/1*thumb.jpeg"
    );
    assert_eq!(
        p1.description,
        "Notes on running discovery & delivery in parallel."
    );

    let p2 = n.normalize(&payload.items[2], 0);
    assert_eq!(p2.title, "Untitled");
    assert_eq!(p2.source_url, "#");
    assert_eq!(p2.image_url, n.fallback_image());
}

#[tokio::test]
async fn http_sends_encoded_feed_url_as_query() {
    let app = Router::new().route(
        "/v1/api.json",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            if q.get("rss_url").map(String::as_str) == Some(FEED) {
                (StatusCode::OK, FIXTURE_JSON.to_string())
            } else {
                (StatusCode::BAD_REQUEST, format!("unexpected query {q:?}"))
            }
        }),
    );
    let endpoint = spawn_upstream(app).await;

    let payload = provider_for(&endpoint).fetch().await.expect("fetch ok");
    assert_eq!(payload.items.len(), 3);
}

#[tokio::test]
async fn http_non_success_status_is_upstream_unavailable() {
    let app = Router::new().route(
        "/v1/api.json",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let endpoint = spawn_upstream(app).await;

    let err = provider_for(&endpoint).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::UpstreamUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn http_non_json_body_is_malformed() {
    let app = Router::new().route(
        "/v1/api.json",
        get(|| async { "<html>rate limited</html>" }),
    );
    let endpoint = spawn_upstream(app).await;

    let err = provider_for(&endpoint).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedPayload(_)), "{err:?}");
}

#[tokio::test]
async fn http_missing_items_is_malformed() {
    let app = Router::new().route(
        "/v1/api.json",
        get(|| async { r#"{"status": "ok", "feed": {}}"# }),
    );
    let endpoint = spawn_upstream(app).await;

    let err = provider_for(&endpoint).fetch().await.unwrap_err();
    assert_eq!(err.kind(), "malformed_payload");
}

#[tokio::test]
async fn unreachable_proxy_is_upstream_unavailable() {
    // Bind then drop to get a port nobody is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider_for(&format!("http://{addr}/v1/api.json"))
        .fetch()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "upstream_unavailable");
}
