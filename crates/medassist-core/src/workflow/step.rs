use tracing::info;

use crate::error::CaseError;
use crate::models::{AmbientContext, Emotion};
use crate::retrieval::KnowledgeRetriever;
use crate::speech::{SpeechRequest, SpeechSynthesizer};

use super::schema::{ContextProfile, EmotionProfile, NodeDescriptor, UtteranceSource};
use super::state::CaseState;

/// A node resolved against the workflow's emotion and context profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub agent_id: String,
    pub emotion: Emotion,
    pub context: AmbientContext,
    pub utterance: UtteranceSource,
}

/// Collaborators a step calls out to.
#[derive(Clone, Copy)]
pub struct StepServices<'a> {
    pub synthesizer: &'a SpeechSynthesizer,
    pub retriever: &'a dyn KnowledgeRetriever,
}

impl AgentStep {
    pub fn resolve(node: &NodeDescriptor, emotions: &EmotionProfile, contexts: &ContextProfile) -> Self {
        Self {
            agent_id: node.id.clone(),
            emotion: emotions.emotion_for(&node.id),
            context: contexts.context_for(&node.id),
            utterance: node.utterance.clone(),
        }
    }

    /// Text this step will speak.
    pub async fn resolve_utterance(
        &self,
        retriever: &dyn KnowledgeRetriever,
        state: &CaseState,
    ) -> Result<String, CaseError> {
        match self.utterance {
            UtteranceSource::Static => Ok(state.script.utterance_for(&self.agent_id)),
            UtteranceSource::Retrieved {
                domain,
                ref question,
            } => retriever.ask(domain, question).await,
        }
    }

    /// Speak, then append the line and its audio to the case state.
    /// Exactly one audio file is written per call.
    pub async fn execute(&self, services: StepServices<'_>, state: &mut CaseState) -> Result<(), CaseError> {
        let utterance = self.resolve_utterance(services.retriever, state).await?;

        let artifact = {
            let request = SpeechRequest {
                text: &utterance,
                agent_id: &self.agent_id,
                emotion: self.emotion,
                context: self.context,
                language: &state.patient.language,
                output_dir: state.workspace.dir(),
            };
            services.synthesizer.synthesize(&request).await?
        };

        info!(
            "[AgentStep] {} ({}, {}) → {}",
            self.agent_id,
            self.emotion,
            self.context,
            artifact.file_name()
        );
        state.record(&self.agent_id, &utterance, artifact);
        Ok(())
    }
}
