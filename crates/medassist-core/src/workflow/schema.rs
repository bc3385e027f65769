//! YAML schema types for case workflow definitions.
//!
//! A workflow is a strictly linear chain of agent nodes:
//!
//! ```yaml
//! name: "Global MedAssist"
//! description: "Emergency abroad, from first call to case closure"
//!
//! nodes:
//!   - id: ClientAgent
//!     emotion: stress
//!
//!   - id: ProviderNetworkAgent
//!     context: hospital
//!     utterance:
//!       source: retrieved
//!       domain: hospital
//!       question: "What care level does Hospital Pasteur provide?"
//!
//!   - id: OrchestratorAgent
//!     emotion: calm
//! ```
//!
//! The first node is the entry point and the last is terminal. Unknown
//! emotion or context strings fall back to `neutral` / `none`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CaseError;
use crate::models::{AmbientContext, Emotion};
use crate::retrieval::KnowledgeDomain;

/// Top-level workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Ordered agent chain; first = entry, last = terminal
    pub nodes: Vec<NodeDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// One agent in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Agent identity, unique within the workflow
    pub id: String,

    /// Where the utterance comes from (default: the case script)
    #[serde(default)]
    pub utterance: UtteranceSource,

    /// Speaking emotion (default: neutral)
    #[serde(default)]
    pub emotion: Emotion,

    /// Ambient bed mixed under the voice (default: none)
    #[serde(default)]
    pub context: AmbientContext,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            utterance: UtteranceSource::Static,
            emotion: Emotion::Neutral,
            context: AmbientContext::None,
        }
    }

    pub fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = emotion;
        self
    }

    pub fn with_context(mut self, context: AmbientContext) -> Self {
        self.context = context;
        self
    }

    pub fn retrieved(mut self, domain: KnowledgeDomain, question: impl Into<String>) -> Self {
        self.utterance = UtteranceSource::Retrieved {
            domain,
            question: question.into(),
        };
        self
    }
}

/// How a node obtains its utterance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum UtteranceSource {
    /// Look the agent up in the case script
    #[default]
    Static,
    /// Ask a canned question against a knowledge domain
    Retrieved {
        domain: KnowledgeDomain,
        question: String,
    },
}

impl WorkflowDefinition {
    /// Parse and validate a workflow definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CaseError> {
        let definition: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CaseError::InvalidWorkflow(format!("Failed to parse workflow YAML: {}", e)))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Load a workflow definition from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CaseError::InvalidWorkflow(format!(
                "Failed to read workflow file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String, CaseError> {
        serde_yaml::to_string(self)
            .map_err(|e| CaseError::InvalidWorkflow(format!("Failed to serialize workflow: {}", e)))
    }

    /// The node sequence must be non-empty and strictly linear: every
    /// identity appears once.
    pub fn validate(&self) -> Result<(), CaseError> {
        if self.nodes.is_empty() {
            return Err(CaseError::InvalidWorkflow(format!(
                "workflow '{}' has no nodes",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if node.id.trim().is_empty() {
                return Err(CaseError::InvalidWorkflow("node with empty id".to_string()));
            }
            // Node ids name the step's audio file inside the run workspace.
            if node.id.contains(['/', '\\']) || node.id.contains("..") {
                return Err(CaseError::InvalidWorkflow(format!(
                    "node id '{}' must not contain path separators or '..'",
                    node.id
                )));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(CaseError::InvalidWorkflow(format!(
                    "duplicate node '{}'",
                    node.id
                )));
            }
            if let UtteranceSource::Retrieved { ref question, .. } = node.utterance {
                if question.trim().is_empty() {
                    return Err(CaseError::InvalidWorkflow(format!(
                        "node '{}' retrieves with an empty question",
                        node.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn entry(&self) -> Option<&NodeDescriptor> {
        self.nodes.first()
    }

    pub fn terminal(&self) -> Option<&NodeDescriptor> {
        self.nodes.last()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// The built-in ten-agent MedAssist chain.
    pub fn medassist() -> Self {
        use AmbientContext::{Airport, Hospital};
        use Emotion::{Calm, Neutral, Stress, Urgent};

        Self {
            name: "Global MedAssist".to_string(),
            description: Some(
                "Emergency abroad, from the first call to case closure".to_string(),
            ),
            version: default_version(),
            nodes: vec![
                NodeDescriptor::new("ClientAgent").with_emotion(Stress),
                NodeDescriptor::new("ClientInteractionAgent").with_emotion(Calm),
                NodeDescriptor::new("TriageMedicalAssessmentAgent").with_emotion(Urgent),
                NodeDescriptor::new("ProviderNetworkAgent")
                    .with_emotion(Neutral)
                    .with_context(Hospital)
                    .retrieved(
                        KnowledgeDomain::Hospital,
                        "What care level does Hospital Pasteur provide?",
                    ),
                NodeDescriptor::new("PolicyValidationAgent")
                    .with_emotion(Neutral)
                    .retrieved(KnowledgeDomain::Policy, "Is repatriation with escort covered?"),
                NodeDescriptor::new("MedicalDocumentationAgent").with_emotion(Calm),
                NodeDescriptor::new("RepatriationPlannerAgent")
                    .with_emotion(Calm)
                    .with_context(Airport),
                NodeDescriptor::new("MedicalDecisionAgent").with_emotion(Calm),
                NodeDescriptor::new("ComplianceConsentAgent").with_emotion(Neutral),
                NodeDescriptor::new("OrchestratorAgent").with_emotion(Calm),
            ],
        }
    }
}

impl Default for WorkflowDefinition {
    fn default() -> Self {
        Self::medassist()
    }
}

/// Agent identity → speaking emotion. Fixed for the life of a definition.
#[derive(Debug, Clone, Default)]
pub struct EmotionProfile {
    emotions: HashMap<String, Emotion>,
}

impl EmotionProfile {
    pub fn from_definition(definition: &WorkflowDefinition) -> Self {
        Self {
            emotions: definition
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.emotion))
                .collect(),
        }
    }

    /// Unknown agents speak neutrally.
    pub fn emotion_for(&self, agent_id: &str) -> Emotion {
        self.emotions.get(agent_id).copied().unwrap_or_default()
    }
}

/// Agent identity → ambient context.
#[derive(Debug, Clone, Default)]
pub struct ContextProfile {
    contexts: HashMap<String, AmbientContext>,
}

impl ContextProfile {
    pub fn from_definition(definition: &WorkflowDefinition) -> Self {
        Self {
            contexts: definition
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.context))
                .collect(),
        }
    }

    pub fn context_for(&self, agent_id: &str) -> AmbientContext {
        self.contexts.get(agent_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_chain() {
        let wf = WorkflowDefinition::medassist();
        wf.validate().unwrap();
        assert_eq!(wf.nodes.len(), 10);
        assert_eq!(wf.entry().unwrap().id, "ClientAgent");
        assert_eq!(wf.terminal().unwrap().id, "OrchestratorAgent");

        let retrieved: Vec<&str> = wf
            .nodes
            .iter()
            .filter(|n| matches!(n.utterance, UtteranceSource::Retrieved { .. }))
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(retrieved, vec!["ProviderNetworkAgent", "PolicyValidationAgent"]);
    }

    #[test]
    fn test_builtin_profiles() {
        let wf = WorkflowDefinition::medassist();
        let emotions = EmotionProfile::from_definition(&wf);
        assert_eq!(emotions.emotion_for("ClientAgent"), Emotion::Stress);
        assert_eq!(emotions.emotion_for("TriageMedicalAssessmentAgent"), Emotion::Urgent);
        assert_eq!(emotions.emotion_for("OrchestratorAgent"), Emotion::Calm);
        assert_eq!(emotions.emotion_for("UnknownAgent"), Emotion::Neutral);

        let contexts = ContextProfile::from_definition(&wf);
        assert_eq!(contexts.context_for("ProviderNetworkAgent"), AmbientContext::Hospital);
        assert_eq!(contexts.context_for("RepatriationPlannerAgent"), AmbientContext::Airport);
        assert_eq!(contexts.context_for("ClientAgent"), AmbientContext::None);
        assert_eq!(contexts.context_for("UnknownAgent"), AmbientContext::None);
    }

    #[test]
    fn test_parse_minimal_workflow() {
        let yaml = r#"
name: "Short Flow"
nodes:
  - id: ClientAgent
    emotion: stress
  - id: AuditAgent
"#;
        let wf = WorkflowDefinition::from_yaml(yaml).unwrap();
        assert_eq!(wf.version, "1.0");
        assert_eq!(wf.nodes[0].emotion, Emotion::Stress);
        assert_eq!(wf.nodes[1].emotion, Emotion::Neutral);
        assert_eq!(wf.nodes[1].context, AmbientContext::None);
        assert_eq!(wf.nodes[1].utterance, UtteranceSource::Static);
    }

    #[test]
    fn test_parse_retrieved_node_and_lenient_tags() {
        let yaml = r#"
name: "Provider Check"
nodes:
  - id: ProviderNetworkAgent
    emotion: ecstatic
    context: hospital
    utterance:
      source: retrieved
      domain: hospital
      question: "What care level does Hospital Pasteur provide?"
  - id: Closer
    context: harbour
"#;
        let wf = WorkflowDefinition::from_yaml(yaml).unwrap();
        assert_eq!(wf.nodes[0].emotion, Emotion::Neutral);
        assert_eq!(wf.nodes[0].context, AmbientContext::Hospital);
        assert_eq!(
            wf.nodes[0].utterance,
            UtteranceSource::Retrieved {
                domain: KnowledgeDomain::Hospital,
                question: "What care level does Hospital Pasteur provide?".to_string(),
            }
        );
        assert_eq!(wf.nodes[1].context, AmbientContext::None);
    }

    #[test]
    fn test_rejects_empty_and_duplicate_nodes() {
        let empty = WorkflowDefinition::from_yaml("name: Empty\nnodes: []\n");
        assert!(matches!(empty, Err(CaseError::InvalidWorkflow(_))));

        let dup = WorkflowDefinition::from_yaml(
            "name: Loop\nnodes:\n  - id: ClientAgent\n  - id: ClientAgent\n",
        );
        assert!(matches!(dup, Err(CaseError::InvalidWorkflow(_))));

        let bad = WorkflowDefinition::from_yaml("name: [unterminated");
        assert!(matches!(bad, Err(CaseError::InvalidWorkflow(_))));
    }

    #[test]
    fn test_rejects_path_like_ids() {
        for id in ["../Escape", "nested/Agent", "win\\Agent", ".."] {
            let wf = WorkflowDefinition {
                name: "paths".to_string(),
                description: None,
                version: "1.0".to_string(),
                nodes: vec![NodeDescriptor::new("ClientAgent"), NodeDescriptor::new(id)],
            };
            assert!(
                matches!(wf.validate(), Err(CaseError::InvalidWorkflow(ref msg)) if msg.contains(id)),
                "id {:?} should be rejected",
                id
            );
        }

        let yaml = "name: Escape\nnodes:\n  - id: ../../etc/Agent\n";
        assert!(matches!(
            WorkflowDefinition::from_yaml(yaml),
            Err(CaseError::InvalidWorkflow(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip_of_builtin() {
        let wf = WorkflowDefinition::medassist();
        let yaml = wf.to_yaml().unwrap();
        assert!(yaml.contains("source: retrieved"));
        assert_eq!(WorkflowDefinition::from_yaml(&yaml).unwrap(), wf);
    }

    #[test]
    fn test_from_file_missing() {
        let result = WorkflowDefinition::from_file("/nonexistent/workflow.yaml");
        assert!(matches!(result, Err(CaseError::InvalidWorkflow(_))));
    }
}
