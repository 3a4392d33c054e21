//! HTTP surface: the request router over the session registry.
//!
//! One stateless endpoint carries the stateful session protocol. Each
//! inbound request is inspected for a session-id header and an
//! initialize shape, then dispatched to the registry to fetch or
//! create the session that will handle it.
//!
//! # Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /mcp` | Protocol messages; initialize with no header creates a session |
//! | `GET /mcp` | Session status (requires a valid session header) |
//! | `DELETE /mcp` | Close the session (requires a valid session header) |
//! | `GET /health` | Liveness plus active-session count |
//! | `GET /debug/sessions` | Live session ids (diagnostic only) |
//!
//! Session errors are always surfaced as HTTP 400; they never crash
//! the process or close unrelated sessions.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::dispatch::CommandDispatcher;
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::message::RpcRequest;
use crate::session::SessionRegistry;

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the session id on requests and initialize responses.
pub const SESSION_HEADER: &str = "mcp-session-id";

// ============================================================================
// AppState
// ============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Owner of all live sessions.
    pub registry: Arc<SessionRegistry>,
    /// Operation registry shared by every session.
    pub dispatcher: Arc<CommandDispatcher>,
    /// Session policy and timeouts.
    pub config: ServerConfig,
}

impl AppState {
    /// Creates state with a fresh registry around the dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<CommandDispatcher>, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(Arc::clone(&dispatcher))),
            dispatcher,
            config,
        }
    }
}

// ============================================================================
// ApiError
// ============================================================================

/// Responder wrapper mapping crate errors onto HTTP statuses.
///
/// Client-correctable errors (session, request, operation) become 400;
/// everything else becomes 500. The body reuses the `{success: false,
/// error}` envelope shape.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the axum application.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/mcp", post(mcp_post).get(mcp_get).delete(mcp_delete))
        .route("/health", get(health))
        .route("/debug/sessions", get(debug_sessions))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Serves the application until `shutdown` resolves, then drains.
///
/// On shutdown every live session is closed and, if a bridge is wired
/// into the dispatcher, its pending calls are drained too. Signal
/// wiring is the caller's concern; any future works as the trigger.
///
/// # Errors
///
/// Returns [`Error::Io`] if serving fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    let dispatcher = Arc::clone(&state.dispatcher);

    let sweeper = state.config.idle_timeout.map(|max_idle| {
        let registry = Arc::clone(&state.registry);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(max_idle);
            loop {
                ticker.tick().await;
                let swept = registry.sweep_idle(max_idle);
                if swept > 0 {
                    debug!(swept, "Idle sweep closed sessions");
                }
            }
        })
    });

    info!(addr = %listener.local_addr()?, "HTTP server listening");

    let app = build_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    registry.shutdown_all();
    if let Ok(bridge) = dispatcher.bridge() {
        bridge.shutdown();
    }

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /mcp`: the multiplexed protocol endpoint.
async fn mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    // Parsed by hand so malformed bodies get a 400 envelope rather
    // than the extractor's default rejection.
    let request: RpcRequest =
        serde_json::from_slice(&body).map_err(|e| Error::invalid_request(e.to_string()))?;

    match session_id_from(&headers)? {
        // Known session: route to it, no construction on this path.
        Some(id) => {
            let session = state.registry.get(id)?;
            let response = session.handle(request).await;
            Ok(Json(response).into_response())
        }

        // No header + initialize shape: the only session-creating path.
        None if request.is_initialize() => {
            let session = state.registry.create()?;
            let response = session.handle(request).await;
            Ok(with_session_header(
                session.id(),
                Json(response).into_response(),
            ))
        }

        // No header, not initialize: lenient development behavior mints
        // an ephemeral session for the direct call.
        None if !state.config.strict_sessions => {
            let session = state.registry.create()?;
            debug!(session_id = %session.id(), "Ephemeral session for direct call");
            let response = session.handle(request).await;
            Ok(with_session_header(
                session.id(),
                Json(response).into_response(),
            ))
        }

        None => Err(Error::invalid_request("missing session id header").into()),
    }
}

/// `GET /mcp`: status of the presented session.
async fn mcp_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    let session = state.registry.get(require_session_id(&headers)?)?;
    Ok(Json(session.status()).into_response())
}

/// `DELETE /mcp`: closes the presented session. Terminal.
async fn mcp_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    let id = require_session_id(&headers)?;
    state.registry.close(id)?;

    Ok(Json(json!({"success": true, "sessionId": id})).into_response())
}

/// `GET /health`: process liveness plus active-session count.
async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "activeSessions": state.registry.session_count(),
    }))
    .into_response()
}

/// `GET /debug/sessions`: live session ids.
async fn debug_sessions(State(state): State<AppState>) -> Response {
    Json(json!({"sessions": state.registry.session_ids()})).into_response()
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts and validates the session header, if present.
///
/// A present-but-malformed header is a client error, not "no session".
fn session_id_from(headers: &HeaderMap) -> std::result::Result<Option<SessionId>, Error> {
    let Some(value) = headers.get(SESSION_HEADER) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| Error::invalid_session("<non-ascii header>"))?;

    let id = raw
        .parse::<SessionId>()
        .map_err(|_| Error::invalid_session(raw))?;

    Ok(Some(id))
}

/// Extracts the session header, rejecting its absence.
fn require_session_id(headers: &HeaderMap) -> std::result::Result<SessionId, Error> {
    session_id_from(headers)?
        .ok_or_else(|| Error::invalid_request("missing session id header"))
}

/// Attaches the session id header to a response.
fn with_session_header(id: SessionId, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

// ============================================================================
// Tests
// ============================================================================
