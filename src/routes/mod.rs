pub mod error;
pub mod redirect;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::db::{Clip, ClipPage, ClipStore, PageRequest, StoreError};
use crate::origin::OriginResolver;
use error::ApiError;

const FLUSH_CONFIRMATION: &str = "Database flushed successfully";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ClipStore>,
    pub origin: OriginResolver,
}

impl AppState {
    pub fn new(store: Arc<ClipStore>, origin: OriginResolver) -> Self {
        Self { store, origin }
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&ClipStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?
            .map_err(ApiError::from)
    }
}

/// Query string for `/clips_paged`. Values stay raw so that malformed input
/// falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Clip API routes only.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/add_clip", post(add_clip).fallback(method_not_allowed))
        .route("/clips", get(list_clips).fallback(method_not_allowed))
        .route(
            "/clips_paged",
            get(list_clips_paged).fallback(method_not_allowed),
        )
        .route("/flush", delete(flush).fallback(method_not_allowed))
        .route(
            "/validate_user",
            get(validate_user).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// API routes plus the static front-end for every other path.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    api_router(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn add_clip(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let clip: Clip = serde_json::from_slice(&body).map_err(ApiError::BadRequest)?;
    let id = clip.id.clone();
    state.with_store(move |store| store.insert_clip(&clip)).await?;
    info!(%id, "clip added");
    Ok(StatusCode::CREATED)
}

async fn list_clips(State(state): State<AppState>) -> Result<Json<Vec<Clip>>, ApiError> {
    let clips = state.with_store(ClipStore::list_clips).await?;
    Ok(Json(clips))
}

async fn list_clips_paged(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ClipPage>, ApiError> {
    let request = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref());
    let page = state
        .with_store(move |store| store.list_clips_paged(request))
        .await?;
    Ok(Json(page))
}

async fn flush(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<&'static str, ApiError> {
    if !state.origin.is_local(&peer.to_string())? {
        warn!(%peer, "refused flush from non-local peer");
        return Err(ApiError::Forbidden);
    }

    let deleted = state.with_store(ClipStore::clear_clips).await?;
    info!(%peer, deleted, "clip store flushed");
    Ok(FLUSH_CONFIRMATION)
}

async fn validate_user(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<StatusCode, ApiError> {
    if state.origin.is_local(&peer.to_string())? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::Forbidden)
    }
}
