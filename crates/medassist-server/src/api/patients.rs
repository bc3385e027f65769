use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use medassist_core::models::PatientCase;
use medassist_core::CaseError;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_patients))
        .route("/{patient_id}", get(get_patient))
}

#[derive(Debug, Serialize)]
struct PatientEntry {
    id: String,
    #[serde(flatten)]
    case: PatientCase,
}

impl PatientEntry {
    fn new(id: &str, case: &PatientCase) -> Self {
        Self {
            id: id.to_string(),
            case: case.clone(),
        }
    }
}

/// GET /api/patients — List the patients a case can be run for.
async fn list_patients(State(state): State<AppState>) -> Json<serde_json::Value> {
    let patients: Vec<PatientEntry> = state
        .runner
        .directory()
        .entries()
        .iter()
        .map(|(id, case)| PatientEntry::new(id, case))
        .collect();
    Json(serde_json::json!({ "patients": patients }))
}

/// GET /api/patients/{patient_id} — Look up one patient (case-insensitive).
async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientEntry>, CaseError> {
    let (id, case) = state
        .runner
        .directory()
        .lookup(&patient_id)
        .ok_or_else(|| CaseError::PatientNotFound(patient_id.clone()))?;
    Ok(Json(PatientEntry::new(id, case)))
}
