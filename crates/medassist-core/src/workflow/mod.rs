//! Case workflow — a declarative agent chain executed over shared case state.
//!
//! # Architecture
//!
//! ```text
//! workflow.yaml ──► WorkflowDefinition ──► WorkflowEngine::plan ──► [AgentStep]
//!                                                                       │
//!   PatientCase ──► CaseScript ──► CaseState ◄──── execute (in order) ──┘
//!                                      │
//!                     KnowledgeRetriever / SpeechSynthesizer
//! ```

pub mod executor;
pub mod schema;
pub mod script;
pub mod state;
pub mod step;

pub use executor::WorkflowEngine;
pub use schema::{ContextProfile, EmotionProfile, NodeDescriptor, UtteranceSource, WorkflowDefinition};
pub use script::{placeholder, CaseScript};
pub use state::{CaseState, RunWorkspace, WorkspaceGuard};
pub use step::{AgentStep, StepServices};
