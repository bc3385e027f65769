//! Case runner — the entry point callers use to run one patient case end to end.
//!
//! A run is all-or-nothing: it either returns a complete `CaseOutcome` or an
//! error, in which case its workspace has already been removed. A run that is
//! cancelled mid-flight removes its workspace too.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::artifacts::ArtifactAssembler;
use crate::config::AppConfig;
use crate::error::CaseError;
use crate::models::PatientDirectory;
use crate::retrieval::{KnowledgeRetriever, OpenAiClient, RagRetriever};
use crate::speech::{GoogleTtsClient, SpeechSynthesizer};
use crate::workflow::{
    CaseScript, CaseState, RunWorkspace, WorkflowDefinition, WorkflowEngine, WorkspaceGuard,
};

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub run_id: String,
    pub patient_id: String,
    pub transcript: Vec<String>,
    pub transcript_text: String,
    pub run_dir: PathBuf,
    pub bundle_path: PathBuf,
    pub combined_audio_path: PathBuf,
    pub document_path: PathBuf,
    pub page_count: usize,
}

/// Runs patient cases through a workflow. Cheap to share; each call to
/// [`CaseRunner::run_case`] owns its own state and workspace.
pub struct CaseRunner {
    directory: PatientDirectory,
    workflow: WorkflowDefinition,
    engine: WorkflowEngine,
    retriever: Arc<dyn KnowledgeRetriever>,
    output_root: PathBuf,
}

impl CaseRunner {
    pub fn new(
        synthesizer: SpeechSynthesizer,
        retriever: Arc<dyn KnowledgeRetriever>,
        workflow: WorkflowDefinition,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, CaseError> {
        workflow.validate()?;
        Ok(Self {
            directory: PatientDirectory::builtin(),
            engine: WorkflowEngine::new(synthesizer, retriever.clone()),
            retriever,
            workflow,
            output_root: output_root.into(),
        })
    }

    /// Wire the production services from configuration. Credential problems
    /// surface here, before any run.
    pub fn from_config(config: &AppConfig) -> Result<Self, CaseError> {
        let tts = GoogleTtsClient::from_credentials_json(&config.credentials_json)?;
        info!("[CaseRunner] Speech service account: {}", tts.client_email());

        let synthesizer = SpeechSynthesizer::new(Arc::new(tts), config.ambient_library());
        let model = OpenAiClient::new(config.openai.clone());
        let retriever = RagRetriever::new(Arc::new(model), config.knowledge_source());

        Self::new(
            synthesizer,
            Arc::new(retriever),
            config.workflow()?,
            &config.output_dir,
        )
    }

    pub fn with_directory(mut self, directory: PatientDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn directory(&self) -> &PatientDirectory {
        &self.directory
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Build retrieval indices ahead of the first run.
    pub async fn warm_up(&self) -> Result<(), CaseError> {
        self.retriever.warm_up().await
    }

    /// Run the workflow for one patient and assemble its artifacts.
    ///
    /// An unknown patient fails before anything touches the filesystem.
    pub async fn run_case(&self, patient_id: &str) -> Result<CaseOutcome, CaseError> {
        let (id, patient) = self
            .directory
            .lookup(patient_id)
            .ok_or_else(|| CaseError::PatientNotFound(patient_id.trim().to_string()))?;

        let workspace = RunWorkspace::create(&self.output_root)?;
        let handle = workspace.clone();
        // Removes the workspace on failure or if this future is dropped.
        let guard = WorkspaceGuard::new(workspace.clone());
        info!(
            "[CaseRunner] Run {} for patient '{}' in {}",
            handle.run_id(),
            id,
            handle.dir().display()
        );

        let state = CaseState::new(id, patient.clone(), CaseScript::for_patient(patient), workspace);

        let result = async {
            let state = self.engine.run(&self.workflow, state).await?;
            let artifacts = ArtifactAssembler::build(&state)?;
            Ok::<_, CaseError>((state, artifacts))
        }
        .await;

        let (state, artifacts) = match result {
            Ok(done) => done,
            Err(e) => {
                error!("[CaseRunner] Run {} failed: {}", handle.run_id(), e);
                return Err(e);
            }
        };
        guard.commit();

        info!(
            "[CaseRunner] Run {} complete: {} steps, bundle {}",
            handle.run_id(),
            state.steps_completed(),
            artifacts.bundle.display()
        );

        Ok(CaseOutcome {
            run_id: handle.run_id().to_string(),
            patient_id: id.to_string(),
            transcript_text: state.transcript_text(),
            transcript: state.transcript().to_vec(),
            run_dir: handle.dir().to_path_buf(),
            bundle_path: artifacts.bundle,
            combined_audio_path: artifacts.combined_audio,
            document_path: artifacts.document,
            page_count: artifacts.page_count,
        })
    }
}
