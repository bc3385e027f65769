//! Workflow Engine — drives a case through the agent chain.
//!
//! The engine:
//! 1. Validates the node sequence (non-empty, unique identities)
//! 2. Resolves every node against the emotion and context profiles
//! 3. Executes the steps strictly in order over one `CaseState`
//! 4. Stops at the first failure and hands it back to the caller

use std::sync::Arc;

use tracing::{error, info};

use crate::error::CaseError;
use crate::retrieval::KnowledgeRetriever;
use crate::speech::SpeechSynthesizer;

use super::schema::{ContextProfile, EmotionProfile, WorkflowDefinition};
use super::state::CaseState;
use super::step::{AgentStep, StepServices};

/// Executes workflow definitions against case state.
#[derive(Clone)]
pub struct WorkflowEngine {
    synthesizer: SpeechSynthesizer,
    retriever: Arc<dyn KnowledgeRetriever>,
}

impl WorkflowEngine {
    pub fn new(synthesizer: SpeechSynthesizer, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        Self {
            synthesizer,
            retriever,
        }
    }

    /// Resolve the definition's nodes into executable steps, in order.
    pub fn plan(definition: &WorkflowDefinition) -> Result<Vec<AgentStep>, CaseError> {
        definition.validate()?;
        let emotions = EmotionProfile::from_definition(definition);
        let contexts = ContextProfile::from_definition(definition);
        Ok(definition
            .nodes
            .iter()
            .map(|node| AgentStep::resolve(node, &emotions, &contexts))
            .collect())
    }

    /// Run every node once, in order. Node *k+1* starts only after node *k*
    /// has finished; the first failure aborts the run.
    pub async fn run(
        &self,
        definition: &WorkflowDefinition,
        mut state: CaseState,
    ) -> Result<CaseState, CaseError> {
        let steps = Self::plan(definition)?;
        let services = StepServices {
            synthesizer: &self.synthesizer,
            retriever: self.retriever.as_ref(),
        };

        info!(
            "[WorkflowEngine] Starting '{}' for {} ({} steps, run {})",
            definition.name,
            state.patient_id,
            steps.len(),
            state.workspace.run_id()
        );

        for (i, step) in steps.iter().enumerate() {
            info!(
                "[WorkflowEngine] Step {}/{}: {}",
                i + 1,
                steps.len(),
                step.agent_id
            );
            if let Err(e) = step.execute(services, &mut state).await {
                error!(
                    "[WorkflowEngine] Step {} failed, aborting run: {}",
                    step.agent_id, e
                );
                return Err(e);
            }
        }

        info!(
            "[WorkflowEngine] Completed '{}' ({} transcript lines)",
            definition.name,
            state.steps_completed()
        );
        Ok(state)
    }
}
