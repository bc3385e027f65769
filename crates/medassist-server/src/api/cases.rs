use std::path::Path as FsPath;

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use medassist_core::CaseError;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{patient_id}/run", post(run_case))
}

/// POST /api/cases/{patient_id}/run — Run the workflow for a patient and
/// return the transcript with download links for the artifacts.
async fn run_case(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<serde_json::Value>, CaseError> {
    tracing::info!("[api/cases] Run requested for '{}'", patient_id);
    let outcome = state.runner.run_case(&patient_id).await?;

    Ok(Json(serde_json::json!({
        "runId": outcome.run_id,
        "patientId": outcome.patient_id,
        "transcript": outcome.transcript,
        "transcriptText": outcome.transcript_text,
        "pageCount": outcome.page_count,
        "artifacts": {
            "bundle": artifact_url(&outcome.run_id, &outcome.bundle_path),
            "combinedAudio": artifact_url(&outcome.run_id, &outcome.combined_audio_path),
            "document": artifact_url(&outcome.run_id, &outcome.document_path),
        },
    })))
}

/// `/artifacts/<run_id>/<file>` for a file inside a run workspace.
fn artifact_url(run_id: &str, path: &FsPath) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("/artifacts/{}/{}", run_id, file)
}
