use std::collections::HashMap;

use crate::models::PatientCase;

/// Per-agent utterances for one patient case. Built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseScript {
    lines: HashMap<String, String>,
}

impl CaseScript {
    /// The MedAssist dialogue, templated on the patient's details.
    pub fn for_patient(patient: &PatientCase) -> Self {
        let lines = [
            (
                "ClientAgent",
                format!("📞 Hello? I had a fall in {}. It hurts badly!", patient.location),
            ),
            (
                "ClientInteractionAgent",
                format!(
                    "Hello {}, you're in {} with '{}'. This is {}.",
                    patient.name, patient.location, patient.symptoms, patient.urgency
                ),
            ),
            (
                "TriageMedicalAssessmentAgent",
                "Ambulance arranged. Requesting medical report.".to_string(),
            ),
            (
                "MedicalDocumentationAgent",
                format!("Requesting Fit-to-Fly certificate for {}.", patient.name),
            ),
            (
                "RepatriationPlannerAgent",
                "Planning business class flight with nurse escort.".to_string(),
            ),
            ("MedicalDecisionAgent", "✅ Case cleared.".to_string()),
            (
                "ComplianceConsentAgent",
                format!("🔐 {} consented to share medical data.", patient.name),
            ),
            (
                "OrchestratorAgent",
                "Case complete. Logs saved and KPIs triggered.".to_string(),
            ),
        ];

        Self {
            lines: lines
                .into_iter()
                .map(|(agent, line)| (agent.to_string(), line))
                .collect(),
        }
    }

    pub fn from_lines(lines: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }

    pub fn get(&self, agent_id: &str) -> Option<&str> {
        self.lines.get(agent_id).map(|s| s.as_str())
    }

    /// Scripted line for the agent, or the generic placeholder.
    pub fn utterance_for(&self, agent_id: &str) -> String {
        self.get(agent_id)
            .map(str::to_string)
            .unwrap_or_else(|| placeholder(agent_id))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Utterance for agents without a scripted line.
pub fn placeholder(agent_id: &str) -> String {
    format!("{} is processing...", agent_id)
}
