use crate::config::Config;
use crate::error::{Result, SocialGraphError};
use crate::graph::project_rows;
use crate::reset::{failed_phase, ResetOrchestrator};
use crate::server::params::{bounded, parse_count};
use crate::store::GraphStore;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Read-path settings the handlers need.
#[derive(Debug, Clone)]
struct GraphSettings {
    default_limit: usize,
    max_limit: usize,
    node_label: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn GraphStore>,
    resetter: Arc<ResetOrchestrator>,
    graph: Arc<GraphSettings>,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, resetter: ResetOrchestrator, config: &Config) -> Self {
        Self {
            store,
            resetter: Arc::new(resetter),
            graph: Arc::new(GraphSettings {
                default_limit: config.graph.default_limit,
                max_limit: config.graph.max_limit,
                node_label: config.graph.node_label.clone(),
            }),
        }
    }
}

/// HTTP front end: graph JSON, reset trigger, and the static visualizer.
pub struct HttpServer {
    state: AppState,
    host: String,
    static_dir: PathBuf,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    pub fn new(state: AppState, config: &Config) -> Self {
        Self {
            state,
            host: config.server.host.clone(),
            static_dir: config.static_dir().to_path_buf(),
            allowed_origins: config.server.allowed_origins.clone(),
        }
    }

    /// Run the HTTP server
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            SocialGraphError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to bind to {}: {}. Set server.port in config.toml to use a different port.",
                    addr, e
                ),
            ))
        })?;

        log::info!("Serving graph API on http://{}", addr);
        log::info!("Static files from {}", self.static_dir.display());

        axum::serve(listener, app).await.map_err(|e| {
            SocialGraphError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    /// Create the axum router
    pub fn router(&self) -> Router {
        // No configured origins means local development: allow any.
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/graph", get(handle_graph))
            .route("/reset", get(handle_reset).post(handle_reset))
            .route("/stats", get(handle_stats))
            .route("/health", get(handle_health))
            .fallback_service(ServeDir::new(&self.static_dir))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CompressionLayer::new())
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }
}

/// Handle graph read (`GET /graph?limit=N`)
async fn handle_graph(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = parse_count(params.get("limit").map(String::as_str), state.graph.default_limit);
    let limit = match bounded(limit, state.graph.max_limit, "limit") {
        Ok(limit) => limit,
        Err(e) => return bad_request(e),
    };

    let rows = match state.store.read_relationships(limit).await {
        Ok(rows) => rows,
        Err(e) => return internal_error("Graph read failed", e),
    };

    match project_rows(rows, &state.graph.node_label) {
        Ok(graph) => (StatusCode::OK, Json(graph)).into_response(),
        Err(e) => internal_error("Graph projection failed", e),
    }
}

/// Handle dataset reset (`GET|POST /reset?count=N`)
///
/// Success answers with a short text acknowledgment; failures answer with
/// an empty body and are logged here.
async fn handle_reset(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let count = parse_count(
        params.get("count").map(String::as_str),
        state.resetter.default_relation_count(),
    );

    match state.resetter.reset(count).await {
        Ok(status) => {
            log::info!("Reset {} done: {} relationships", status.reset_id, status.written);
            (StatusCode::OK, "Reset OK").into_response()
        }
        Err(e @ SocialGraphError::InvalidParameter(_)) => {
            log::warn!("Rejected reset request: {}", e);
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(e) => {
            log::error!("Reset failed during {:?}: {}", failed_phase(&e), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handle dataset totals (`GET /stats`)
async fn handle_stats(State(state): State<AppState>) -> Response {
    match state.store.counts().await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(e) => internal_error("Stats read failed", e),
    }
}

/// Handle health check endpoint
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "socialgraph",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

fn bad_request(e: SocialGraphError) -> Response {
    log::warn!("Rejected request: {}", e);
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

fn internal_error(context: &str, e: SocialGraphError) -> Response {
    log::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}
