pub mod auth;
pub mod files;
pub mod members;
pub mod projects;
pub mod tasks;

use axum::error_handling::HandleErrorLayer;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{delete, get, put};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{self, AppConfig};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Assemble the full router: public root/health plus the JWT-gated `/api`
/// surface, with CORS, tracing, and a request timeout bound.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let api = Router::new()
        .merge(auth_routes())
        .merge(project_routes())
        .merge(task_routes())
        .merge(member_routes())
        .merge(file_routes())
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|_: BoxError| async {
                    StatusCode::REQUEST_TIMEOUT
                }))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/me", get(auth::me))
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:project_id",
            get(projects::show)
                .put(projects::update)
                .delete(projects::destroy),
        )
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/tasks",
            get(tasks::list).post(tasks::create),
        )
        .route("/tasks/:task_id", put(tasks::update).delete(tasks::destroy))
        .route("/my-tasks", get(tasks::assigned))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/members",
            get(members::list).post(members::add),
        )
        .route(
            "/projects/:project_id/members/:member_id",
            put(members::update).delete(members::remove),
        )
}

fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/files",
            get(files::list).post(files::create),
        )
        .route("/files/:file_id", delete(files::destroy))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "message": "TeamCamp API",
        "version": version,
        "endpoints": {
            "auth": "/api/auth",
            "projects": "/api/projects",
            "tasks": "/api/projects/:id/tasks, /api/tasks/:id, /api/my-tasks",
            "members": "/api/projects/:id/members",
            "files": "/api/projects/:id/files, /api/files/:id"
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "ok" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database_error": e.to_string() })),
        ),
    }
}
