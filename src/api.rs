use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::metrics::Metrics;
use crate::store::MessageStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
}

/// Read-only status surface over the store. `/metrics` is mounted only when a
/// recorder handle is supplied.
pub fn create_router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/profiles", get(list_profiles))
        .route("/profiles/{symbol}", get(get_profile))
        .with_state(state);

    match metrics {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}

async fn list_profiles(State(state): State<AppState>) -> Response {
    match state.store.profiles().await {
        Ok(all) => Json(all).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_profile(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match state.store.profile(&symbol).await {
        Ok(Some(p)) => Json(p).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("no profile for {symbol}")).into_response(),
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!(error = ?e, "store read failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "store error").into_response()
}
