#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

use terraconsole_api::auth::jwt::{generate_token, JwtConfig};
use terraconsole_api::config::ServerConfig;
use terraconsole_api::executor::ExecutorChannel;
use terraconsole_api::router::build_app_router;
use terraconsole_api::state::AppState;
use terraconsole_core::authorization::AllowAuthenticated;
use terraconsole_core::executor::ExecutorCommand;
use terraconsole_db::models::workspace::{CreateWorkspace, Workspace};
use terraconsole_db::repositories::WorkspaceRepo;

pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        state_body_limit_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
    }
}

/// Build the full application router over `pool`, returning a receiver that
/// sees every executor command.
pub fn build_test_app_with_executor(
    pool: PgPool,
) -> (Router, broadcast::Receiver<ExecutorCommand>) {
    let config = test_config();
    let executor = Arc::new(ExecutorChannel::default());
    let commands = executor.subscribe();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        authorizer: Arc::new(AllowAuthenticated),
        executor,
    };

    (build_app_router(state, &config), commands)
}

pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_executor(pool).0
}

/// Mint a valid token for `principal`.
pub fn token_for(principal: Uuid) -> String {
    let config = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
    };
    generate_token(principal, 3600, &config).expect("token should sign")
}

/// `Authorization` header value in the form Terraform's HTTP backend sends.
pub fn basic_auth(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("terraform:{token}")))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_project(pool: &PgPool, name: &str) -> Uuid {
    let row: (Uuid,) = sqlx::query_as("INSERT INTO projects (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("project insert should succeed");
    row.0
}

pub async fn create_workspace(pool: &PgPool, name: &str) -> Workspace {
    let project_id = create_project(pool, &format!("project-{name}")).await;
    let input = CreateWorkspace {
        name: name.to_string(),
        terraform_version: None,
        auto_apply: None,
    };
    WorkspaceRepo::create(pool, project_id, &input)
        .await
        .expect("workspace creation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    if let Some(value) = content_type {
        builder = builder.header("content-type", value);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Body::empty(), None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(&bearer(token)), Body::empty(), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(&bearer(token)), Body::empty(), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(&bearer(token)), Body::empty(), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(&bearer(token)),
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

/// POST a raw body the way Terraform pushes state.
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    body: impl Into<Body>,
    token: &str,
) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(&bearer(token)),
        body.into(),
        Some("application/json"),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
