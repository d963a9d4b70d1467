use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::{CONTENT_TYPE, ORIGIN}, request::Parts, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};
use visit_tracker_lib::UNKNOWN;

use crate::server_state::ServerState;

pub fn build_router(server_state: Arc<ServerState>) -> Router {
    let origins = server_state.config.allowed_origins.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|origin| origins.iter().any(|allowed| allowed == origin))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .nest_service("/dashboard", ServeDir::new("server/static"))
        .route("/", get(root))
        .route("/track", post(track))
        .route("/visits", get(get_visits))
        .with_state(server_state.clone())
        .layer(cors)
        .layer(from_fn_with_state(server_state, enforce_origin))
}

/// Rejects any request whose Origin header is not on the allow-list before
/// it reaches a handler. Requests without an Origin header pass: those are
/// same-origin or non-browser callers.
async fn enforce_origin(State(state): State<Arc<ServerState>>, req: Request<Body>, next: Next) -> Response {
    if let Some(origin) = req.headers().get(ORIGIN).and_then(|value| value.to_str().ok()) {
        if !state.config.origin_allowed(origin) {
            tracing::warn!("Blocked request from disallowed origin: {}", origin);
            return (StatusCode::FORBIDDEN, Json(json!({ "error": "Origin not allowed" }))).into_response();
        }
    }

    next.run(req).await
}

async fn root() -> &'static str {
    "Visit tracking server is running"
}

async fn track(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    tracing::info!("Received POST on /track");

    // Any JSON object is accepted as-is. Anything else is tolerated as an
    // empty attribute map.
    let payload = match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let client_ip = client_ip(&headers, Some(addr));

    match state.data_manager.record_visit(payload, client_ip).await {
        Ok(record) => {
            tracing::info!("Saved visit: {:?}", record);
            Json(json!({ "message": "OK" })).into_response()
        }
        Err(err) => {
            tracing::error!("Failed to save visit: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to save visit" }))).into_response()
        }
    }
}

async fn get_visits(State(state): State<Arc<ServerState>>) -> Response {
    match state.data_manager.get_visits().await {
        Ok(visits) => Json(visits).into_response(),
        Err(err) => {
            tracing::error!("Failed to read visit log: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Failed to read visits" }))).into_response()
        }
    }
}

/// Client address as reported by the reverse proxy, falling back to the
/// socket peer address and finally to the "Unknown" sentinel. IPv4-mapped
/// IPv6 addresses are unwrapped so the geo providers see a plain IPv4
/// address.
fn client_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|value| value.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    let Some(addr) = addr else {
        return UNKNOWN.to_string();
    };

    let ip = addr.ip().to_string();
    match ip.strip_prefix("::ffff:") {
        Some(stripped) => stripped.to_string(),
        None => ip,
    }
}
