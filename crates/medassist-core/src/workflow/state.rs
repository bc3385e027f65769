use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CaseError;
use crate::models::PatientCase;
use crate::speech::AudioArtifact;

use super::script::CaseScript;

/// A run's private output directory: `<root>/<run_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkspace {
    run_id: String,
    dir: PathBuf,
}

impl RunWorkspace {
    /// Create a fresh directory under `root`. The directory must not exist yet.
    pub fn create(root: impl AsRef<Path>) -> Result<Self, CaseError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let run_id = format!(
            "{}-{}",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let dir = root.join(&run_id);
        std::fs::create_dir(&dir)?;
        debug!("[RunWorkspace] Created {}", dir.display());

        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the workspace and everything in it.
    pub fn discard(self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            warn!(
                "[RunWorkspace] Failed to remove {}: {}",
                self.dir.display(),
                e
            );
        }
    }
}

/// Removes its workspace when dropped, unless committed first. Covers both
/// the error path and a run future that is dropped mid-flight.
#[derive(Debug)]
pub struct WorkspaceGuard {
    workspace: Option<RunWorkspace>,
}

impl WorkspaceGuard {
    pub fn new(workspace: RunWorkspace) -> Self {
        Self {
            workspace: Some(workspace),
        }
    }

    /// Keep the workspace on disk.
    pub fn commit(mut self) {
        if let Some(workspace) = self.workspace.take() {
            debug!("[RunWorkspace] Committed {}", workspace.dir().display());
        }
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            warn!(
                "[RunWorkspace] Run {} did not complete, removing {}",
                workspace.run_id(),
                workspace.dir().display()
            );
            workspace.discard();
        }
    }
}

/// Mutable state threaded through one workflow run.
///
/// The transcript and audio trail only grow, one entry each per executed
/// step, in execution order.
#[derive(Debug)]
pub struct CaseState {
    pub patient_id: String,
    pub patient: PatientCase,
    pub script: CaseScript,
    pub workspace: RunWorkspace,
    transcript: Vec<String>,
    audio: Vec<AudioArtifact>,
}

impl CaseState {
    pub fn new(
        patient_id: impl Into<String>,
        patient: PatientCase,
        script: CaseScript,
        workspace: RunWorkspace,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            patient,
            script,
            workspace,
            transcript: Vec::new(),
            audio: Vec::new(),
        }
    }

    /// Append one step's outcome.
    pub fn record(&mut self, agent_id: &str, utterance: &str, artifact: AudioArtifact) {
        self.transcript.push(format!("{}: {}", agent_id, utterance));
        self.audio.push(artifact);
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn audio(&self) -> &[AudioArtifact] {
        &self.audio
    }

    pub fn transcript_text(&self) -> String {
        self.transcript.join("\n")
    }

    pub fn steps_completed(&self) -> usize {
        self.transcript.len()
    }

    pub fn output_dir(&self) -> &Path {
        self.workspace.dir()
    }
}
