//! API request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::routes::AppState;
use crate::error::Error;
use crate::types::{ObjectId, Todo, TodoDocument, TodoUpdate};

// Request bodies

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    /// Title of the todo; must not be empty
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    /// New title; must not be empty
    #[serde(default)]
    pub title: String,
    /// New completion state
    #[serde(default)]
    pub completed: bool,
}

// Response types

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse {
    /// Every stored todo
    pub data: Vec<Todo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub message: String,
    /// Identifier of the new todo
    #[serde(rename = "Todo ID")]
    pub todo_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub message: String,
    /// Underlying error detail, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            error: None,
        }),
    )
}

fn fail(status: StatusCode, message: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            error: Some(error.to_string()),
        }),
    )
}

/// Not-found is the caller's problem; everything else the store reports is ours
fn store_failure(message: &str, err: Error) -> ApiError {
    let status = match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!("{}: {}", message, err);
    fail(status, message, err)
}

fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Invalid id"))
}

// Handlers

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// List all todos
#[utoipa::path(
    get,
    path = "/todo/",
    responses(
        (status = 200, description = "All todos", body = ListResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "todos"
)]
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let docs = state
        .todos
        .find_all()
        .await
        .map_err(|e| store_failure("Failed to fetch todos", e))?;

    Ok(Json(ListResponse {
        data: docs.into_iter().map(Todo::from).collect(),
    }))
}

/// Create a new todo
#[utoipa::path(
    post,
    path = "/todo/",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = CreatedResponse),
        (status = 400, description = "Malformed body or empty title", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "todos"
)]
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) =
        payload.map_err(|e| fail(StatusCode::BAD_REQUEST, "Invalid request body", e.body_text()))?;

    if req.title.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let doc = TodoDocument::new(req.title);
    let id = state
        .todos
        .insert(&doc)
        .await
        .map_err(|e| store_failure("Failed to save todo", e))?;

    tracing::info!(%id, "created todo");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Todo created successfully".into(),
            todo_id: id.to_hex(),
        }),
    ))
}

/// Update a todo's title and completion state
#[utoipa::path(
    put,
    path = "/todo/{id}",
    params(
        ("id" = String, Path, description = "Hex-encoded todo id")
    ),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = MessageResponse),
        (status = 400, description = "Invalid id, malformed body or empty title", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "todos"
)]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    let Json(req) =
        payload.map_err(|e| fail(StatusCode::BAD_REQUEST, "Invalid request body", e.body_text()))?;

    if req.title.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let update = TodoUpdate {
        title: req.title,
        completed: req.completed,
    };
    state
        .todos
        .update_by_id(id, &update)
        .await
        .map_err(|e| store_failure("Failed to update todo", e))?;

    tracing::info!(%id, "updated todo");
    Ok(Json(MessageResponse {
        message: "Todo updated successfully".into(),
    }))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/todo/{id}",
    params(
        ("id" = String, Path, description = "Hex-encoded todo id")
    ),
    responses(
        (status = 200, description = "Todo deleted", body = MessageResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "todos"
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    state
        .todos
        .delete_by_id(id)
        .await
        .map_err(|e| store_failure("Failed to remove todo", e))?;

    tracing::info!(%id, "deleted todo");
    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".into(),
    }))
}
