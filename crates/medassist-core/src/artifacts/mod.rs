//! Artifact assembly — turns a finished case into downloadable outputs.
//!
//! ```text
//! CaseState ─┬─► case_log.txt
//!            ├─► <patient>_conversation.pdf
//!            ├─► <patient>_full_convo.wav   (step audio, concatenated)
//!            └─► case_export.zip            (step audio + the three above)
//! ```

pub mod bundle;
pub mod transcript;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::audio::PcmAudio;
use crate::error::CaseError;
use crate::speech::AudioArtifact;
use crate::workflow::CaseState;

pub use bundle::write_bundle;
pub use transcript::{header_text, paginate, render_pdf, PageLayout};

pub const LOG_FILE_NAME: &str = "case_log.txt";
pub const BUNDLE_FILE_NAME: &str = "case_export.zip";

pub fn document_file_name(patient_id: &str) -> String {
    format!("{}_conversation.pdf", patient_id)
}

pub fn combined_audio_file_name(patient_id: &str) -> String {
    format!("{}_full_convo.wav", patient_id)
}

/// Paths of everything the assembler wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledArtifacts {
    pub transcript_log: PathBuf,
    pub document: PathBuf,
    pub combined_audio: PathBuf,
    pub bundle: PathBuf,
    pub page_count: usize,
    pub bundle_members: usize,
}

/// Builds the transcript log, document, combined track and bundle for a
/// completed case, inside the case's workspace.
pub struct ArtifactAssembler;

impl ArtifactAssembler {
    pub fn build(state: &CaseState) -> Result<AssembledArtifacts, CaseError> {
        let dir = state.output_dir();

        let transcript_log = dir.join(LOG_FILE_NAME);
        std::fs::write(&transcript_log, state.transcript_text())?;

        let document = dir.join(document_file_name(&state.patient_id));
        let page_count = render_pdf(
            state.transcript(),
            &header_text(chrono::Local::now()),
            &document,
        )?;
        info!(
            "[ArtifactAssembler] Wrote {} ({} pages)",
            document.display(),
            page_count
        );

        let combined_audio = dir.join(combined_audio_file_name(&state.patient_id));
        let duration = combine_audio(state.audio(), &combined_audio)?;
        info!(
            "[ArtifactAssembler] Wrote {} ({:.1}s)",
            combined_audio.display(),
            duration
        );

        let mut members: Vec<PathBuf> = state.audio().iter().map(|a| a.path.clone()).collect();
        members.push(transcript_log.clone());
        members.push(document.clone());
        members.push(combined_audio.clone());

        let bundle = dir.join(BUNDLE_FILE_NAME);
        let bundle_members = write_bundle(&bundle, &members)?;
        info!(
            "[ArtifactAssembler] Wrote {} ({} members)",
            bundle.display(),
            bundle_members
        );

        Ok(AssembledArtifacts {
            transcript_log,
            document,
            combined_audio,
            bundle,
            page_count,
            bundle_members,
        })
    }
}

/// Concatenate step audio in order, back to back, into one WAV file.
/// Returns the combined duration in seconds.
pub fn combine_audio(artifacts: &[AudioArtifact], dest: &Path) -> Result<f64, CaseError> {
    let segments = artifacts
        .iter()
        .map(|a| PcmAudio::read_wav(&a.path))
        .collect::<Result<Vec<_>, _>>()?;
    let combined = PcmAudio::concat(segments)?;
    combined.write_wav(dest)?;
    Ok(combined.duration_secs())
}
