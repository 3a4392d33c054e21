//! HTTP surface tests exercising the router end to end.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bridgemux::{AppState, CommandDispatcher, Error, SESSION_HEADER, ServerConfig, build_app};
use tracing_subscriber::EnvFilter;

/// Initialize tracing for test debugging (`RUST_LOG` opt-in).
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Builds a test app with a couple of registered operations.
fn test_app(config: ServerConfig) -> Router {
    init_logging();

    let dispatcher = Arc::new(CommandDispatcher::new());
    dispatcher.register_operation("app.ping", |_params| async { Ok(json!("pong")) });
    dispatcher.register_operation("app.fail", |_params| async {
        Err(Error::remote("store not found"))
    });

    build_app(AppState::new(dispatcher, config))
}

fn post_mcp(body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/mcp");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_mcp(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/mcp");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).expect("request")
}

fn delete_mcp(session: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header(SESSION_HEADER, session)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn session_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("session header")
        .to_str()
        .expect("ascii")
        .to_string()
}

#[tokio::test]
async fn initialize_creates_session_and_its_id_routes() {
    let app = test_app(ServerConfig::new());

    // Initialize with no session header.
    let response = app
        .clone()
        .oneshot(post_mcp(json!({"id": 1, "method": "initialize"}), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let id = session_header(&response);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["data"]["sessionId"], json!(id));

    // The returned id routes subsequent requests.
    let response = app
        .clone()
        .oneshot(get_mcp(Some(&id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["sessionId"], json!(id));

    // A random unknown id does not.
    let unknown = bridgemux::SessionId::generate().to_string();
    let response = app.oneshot(get_mcp(Some(&unknown))).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_unknown_session_is_rejected() {
    let app = test_app(ServerConfig::new());
    let unknown = bridgemux::SessionId::generate().to_string();

    let response = app
        .oneshot(post_mcp(json!({"method": "app.ping"}), Some(&unknown)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn closed_session_cannot_be_resurrected() {
    let app = test_app(ServerConfig::new());

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "initialize"}), None))
        .await
        .expect("response");
    let id = session_header(&response);

    let response = app.clone().oneshot(delete_mcp(&id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // The old id is invalid on every route, including POST.
    let response = app
        .clone()
        .oneshot(get_mcp(Some(&id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "app.ping"}), Some(&id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Deleting twice is also rejected.
    let response = app.oneshot(delete_mcp(&id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_initializes_produce_independent_sessions() {
    let app = test_app(ServerConfig::new());

    let (a, b) = tokio::join!(
        app.clone()
            .oneshot(post_mcp(json!({"method": "initialize"}), None)),
        app.clone()
            .oneshot(post_mcp(json!({"method": "initialize"}), None)),
    );

    let id_a = session_header(&a.expect("a"));
    let id_b = session_header(&b.expect("b"));
    assert_ne!(id_a, id_b);

    // Each independently closable; closing one leaves the other live.
    let response = app.clone().oneshot(delete_mcp(&id_a)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_mcp(Some(&id_b)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(delete_mcp(&id_b)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lenient_mode_mints_ephemeral_session_for_direct_calls() {
    let app = test_app(ServerConfig::new());

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "app.ping"}), None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let id = session_header(&response);
    let body = body_json(response).await;
    assert_eq!(body, json!({"success": true, "data": "pong"}));

    // The ephemeral session is live and addressable.
    let response = app.oneshot(get_mcp(Some(&id))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn strict_mode_rejects_direct_calls() {
    let app = test_app(ServerConfig::new().with_strict_sessions());

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "app.ping"}), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Initialize still works under strict policy.
    let response = app
        .oneshot(post_mcp(json!({"method": "initialize"}), None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn operation_failures_stay_inside_the_envelope() {
    let app = test_app(ServerConfig::new());

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "initialize"}), None))
        .await
        .expect("response");
    let id = session_header(&response);

    // A failing operation is HTTP 200 with a failure envelope.
    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "app.fail"}), Some(&id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Remote error: store not found"));

    // So is an unknown operation.
    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "app.nope"}), Some(&id)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Unknown operation: app.nope"));

    // The session survived both failures.
    let response = app.oneshot(get_mcp(Some(&id))).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let app = test_app(ServerConfig::new());

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .body(Body::from("{not json"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn malformed_session_header_is_a_client_error() {
    let app = test_app(ServerConfig::new());

    let response = app
        .oneshot(post_mcp(json!({"method": "app.ping"}), Some("not-a-uuid")))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_active_session_count() {
    let app = test_app(ServerConfig::new());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"status": "ok", "activeSessions": 0}));

    let response = app
        .clone()
        .oneshot(post_mcp(json!({"method": "initialize"}), None))
        .await
        .expect("response");
    let id = session_header(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(body["activeSessions"], json!(1));

    // The diagnostic listing names the live session.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/debug/sessions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let body = body_json(response).await;
    assert_eq!(body["sessions"], json!([id]));
}
