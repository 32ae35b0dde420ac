//! HTTP gateway for Shopdesk.
//!
//! Routes (all under `/api`):
//! - `GET  /api/health`: liveness probe
//! - `POST /api/chat`  : send `{message, session_id?}`, receive an SSE stream
//!
//! Each SSE frame is a bare `data:` line holding one JSON event:
//! `{"type":"chunk","text":...}`, then `{"type":"done","session_id":...}` or
//! `{"type":"error","message":...}`.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::response::sse::{Event as SseEvent, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Router, extract::State};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use shopdesk_agent::AgentLoop;
use shopdesk_config::{AppConfig, GatewayConfig};
use shopdesk_core::message::SessionId;
use shopdesk_store::SqliteStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentLoop>,
}

type SharedState = Arc<GatewayState>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Build the router with the API routes, CORS, body limit, and trace logging.
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS for the configured browser origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

/// `POST /api/chat`: answer one message as a stream of SSE frames.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_id = payload
        .session_id
        .filter(|s| !s.is_empty())
        .map(SessionId);

    let (session_id, rx) = state.agent.stream(payload.message, session_id);
    info!(session = %session_id, "Chat request");

    let stream = ReceiverStream::new(rx).map(move |event| {
        if event.is_terminal() {
            info!(session = %session_id, outcome = event.event_type(), "Chat stream finished");
        }
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(SseEvent::default().data(data))
    });

    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Sse::new(stream),
    )
}

/// Start the gateway HTTP server.
///
/// Opens the database, builds the provider and the lookup tools, and serves
/// until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections).await?,
    );
    let provider = Arc::new(shopdesk_providers::build_from_config(&config)?);
    let tools = Arc::new(shopdesk_tools::default_registry(store.clone()));
    let agent = Arc::new(AgentLoop::from_config(&config, provider, store, tools));

    let app = build_router(Arc::new(GatewayState { agent }), &config.gateway);

    info!(addr = %addr, model = %config.default_model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
