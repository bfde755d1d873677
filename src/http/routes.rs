//! HTTP route definitions

use axum::{
    extract::{Request, State},
    http::{header, Method, Uri},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::app::AppState;
use crate::arena::targets::{target_map, TargetEntry, ARENA_HEIGHT, ARENA_WIDTH, MOVE_SPEED};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::Role;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/targets", get(targets_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors)
        .with_state(state)
}

/// Query parameters whose values never reach the logs
const REDACTED_PARAMS: &[&str] = &["token"];

/// Request span without secrets; admin tokens ride in the `/ws` query string
fn request_span(req: &Request) -> Span {
    tracing::debug_span!(
        "request",
        method = %req.method(),
        uri = %redacted_uri(req.uri()),
        version = ?req.version(),
    )
}

fn redacted_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if REDACTED_PARAMS.contains(&key) => format!("{key}=[redacted]"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", uri.path(), query.join("&"))
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    relay_open: bool,
    connections: usize,
    admins: usize,
    viewers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        relay_open: state.relay.is_open(),
        connections: state.connections.total(),
        admins: state.connections.count_role(Role::Admin),
        viewers: state.connections.count_role(Role::Viewer),
    })
}

// ============================================================================
// Arena layout
// ============================================================================

#[derive(Debug, Serialize)]
struct TargetsResponse {
    width: f32,
    height: f32,
    speed: f32,
    targets: Vec<TargetEntry>,
}

async fn targets_handler() -> Json<TargetsResponse> {
    Json(TargetsResponse {
        width: ARENA_WIDTH,
        height: ARENA_HEIGHT,
        speed: MOVE_SPEED,
        targets: target_map(),
    })
}
