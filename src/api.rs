use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::CacheState;
use crate::engine::{now_ms, IngestionEngine};
use crate::ingest::types::PostsEnvelope;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<IngestionEngine>,
}

impl AppState {
    pub fn new(engine: IngestionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/posts", get(list_posts))
        .route("/debug/cache", get(debug_cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_posts(State(state): State<AppState>) -> (StatusCode, Json<PostsEnvelope>) {
    let env = state.engine.list_posts().await;
    let status = if env.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(env))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheInfo {
    state: &'static str,
    source: &'static str,
    freshness_ms: u64,
    posts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetched_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age_ms: Option<i64>,
}

async fn debug_cache(State(state): State<AppState>) -> Json<CacheInfo> {
    let engine = &state.engine;
    let freshness_ms = u64::try_from(engine.cache().freshness().as_millis()).unwrap_or(u64::MAX);

    let info = match engine.cache_state() {
        CacheState::Empty => CacheInfo {
            state: "empty",
            source: engine.source_name(),
            freshness_ms,
            posts: 0,
            fetched_at_ms: None,
            age_ms: None,
        },
        CacheState::Populated {
            fetched_at_ms,
            posts,
        } => CacheInfo {
            state: "populated",
            source: engine.source_name(),
            freshness_ms,
            posts,
            fetched_at_ms: Some(fetched_at_ms),
            age_ms: Some(now_ms().saturating_sub(fetched_at_ms).max(0)),
        },
    };
    Json(info)
}
