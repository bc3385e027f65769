pub mod cases;
pub mod patients;
pub mod workflow;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/patients", patients::router())
        .nest("/api/workflow", workflow::router())
        .nest("/api/cases", cases::router())
}
