//! Core error type for MedAssist.
//!
//! `CaseError` is used throughout the core domain (engine, speech, retrieval,
//! assembly). When the `axum` feature is enabled, it also implements
//! `IntoResponse` so it can be used directly as an axum handler error type.

use crate::audio::AudioError;

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Knowledge retrieval failed: {0}")]
    RetrievalFailure(String),

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("Audio processing failed: {0}")]
    Audio(#[from] AudioError),

    #[error("Artifact assembly failed: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for CaseError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            CaseError::PatientNotFound(_) => StatusCode::NOT_FOUND,
            CaseError::InvalidWorkflow(_) => StatusCode::BAD_REQUEST,
            CaseError::SynthesisFailure(_) | CaseError::RetrievalFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            CaseError::MissingCredential(_)
            | CaseError::Audio(_)
            | CaseError::Artifact(_)
            | CaseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
