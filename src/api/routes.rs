//! API route definitions

use axum::{
    Router,
    routing::{get, put},
    response::IntoResponse,
    http::{StatusCode, Uri, header},
};
use rust_embed::RustEmbed;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    self, CreateTodoRequest, CreatedResponse, ErrorResponse, HealthResponse, ListResponse,
    MessageResponse, UpdateTodoRequest,
};
use crate::store::TodoStore;
use crate::types::Todo;

const HOME_PAGE: &str = "home.html";

/// Embedded home page and its assets
#[derive(RustEmbed)]
#[folder = "static"]
struct Asset;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "todo-api",
        version = "0.1.0",
        description = "Minimal JSON to-do list backed by a document store"
    ),
    tags(
        (name = "todos", description = "Todo management"),
        (name = "health", description = "Health checks")
    ),
    paths(
        handlers::health,
        handlers::list_todos,
        handlers::create_todo,
        handlers::update_todo,
        handlers::delete_todo,
    ),
    components(schemas(
        Todo,
        ListResponse,
        CreatedResponse,
        MessageResponse,
        HealthResponse,
        ErrorResponse,
        CreateTodoRequest,
        UpdateTodoRequest,
    ))
)]
pub struct ApiDoc;

fn serve_asset(path: &str) -> Option<axum::response::Response> {
    Asset::get(path).map(|content| {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
    })
}

/// Home page
async fn home() -> impl IntoResponse {
    match serve_asset(HOME_PAGE) {
        Some(response) => response,
        None => {
            tracing::error!("home page asset {} is missing from the build", HOME_PAGE);
            (StatusCode::INTERNAL_SERVER_ERROR, "Home page unavailable").into_response()
        }
    }
}

/// Static file handler for embedded assets
async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    serve_asset(path).unwrap_or_else(|| (StatusCode::NOT_FOUND, "Not found").into_response())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
}

impl AppState {
    pub fn new(todos: Arc<dyn TodoStore>) -> Self {
        Self { todos }
    }
}

/// Create the API router
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let openapi = ApiDoc::openapi();

    Router::new()
        // Home
        .route("/", get(home))

        // Todos CRUD
        .route("/todo", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todo/", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todo/{id}", put(handlers::update_todo).delete(handlers::delete_todo))

        // Health
        .route("/health", get(handlers::health))

        // OpenAPI spec and Swagger UI
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi))

        // Static files
        .fallback(static_handler)

        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
