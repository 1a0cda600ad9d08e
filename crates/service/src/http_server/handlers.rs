use axum::extract::State;
use axum::response::IntoResponse;

use crate::ServiceState;

pub async fn root(State(state): State<ServiceState>) -> String {
    format!("{} service", state.name())
}

pub async fn ready(State(state): State<ServiceState>) -> String {
    format!("{} service is ready", state.name())
}

pub async fn live(State(state): State<ServiceState>) -> String {
    format!("{} service is alive", state.name())
}

pub async fn version(State(state): State<ServiceState>) -> String {
    state.version().to_string()
}

pub async fn not_found() -> impl IntoResponse {
    (http::StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Same text as Go's `http.NotFound`, trailing newline included.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";
