use axum::{extract::State, routing::get, Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_workflow))
}

/// GET /api/workflow — The agent chain every case runs through.
async fn get_workflow(State(state): State<AppState>) -> Json<serde_json::Value> {
    let workflow = state.runner.workflow();
    Json(serde_json::json!({
        "workflow": workflow,
        "entry": workflow.entry().map(|n| n.id.as_str()),
        "terminal": workflow.terminal().map(|n| n.id.as_str()),
        "steps": workflow.nodes.len(),
    }))
}
