//! HTTP API layer

mod routes;
mod handlers;

pub use handlers::{
    CreatedResponse, ErrorResponse, HealthResponse, ListResponse, MessageResponse,
};
pub use routes::{create_router, ApiDoc, AppState};
