use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Emergency,
    Outpatient,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Outpatient => "outpatient",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient case as returned by the directory. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientCase {
    pub name: String,
    pub location: String,
    pub symptoms: String,
    pub urgency: Urgency,
    /// Language code used for voice selection (`fr`, `en`).
    pub language: String,
}

impl PatientCase {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        symptoms: impl Into<String>,
        urgency: Urgency,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            symptoms: symptoms.into(),
            urgency,
            language: language.into(),
        }
    }
}

/// Fixed directory of known patients, keyed by lowercase identifier.
#[derive(Debug, Clone)]
pub struct PatientDirectory {
    entries: Vec<(String, PatientCase)>,
}

impl PatientDirectory {
    /// The reference deployment's closed set of patients.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                (
                    "anne".to_string(),
                    PatientCase::new("Anne", "Nice, France", "severe leg pain", Urgency::Emergency, "fr"),
                ),
                (
                    "liam".to_string(),
                    PatientCase::new(
                        "Liam",
                        "Da Nang, Vietnam",
                        "fever and dizziness",
                        Urgency::Outpatient,
                        "en",
                    ),
                ),
                (
                    "priya".to_string(),
                    PatientCase::new(
                        "Priya",
                        "Doha Airport, Qatar",
                        "abdominal pain",
                        Urgency::Emergency,
                        "en",
                    ),
                ),
            ],
        }
    }

    /// Build a directory from explicit entries. Identifiers are lowercased.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, PatientCase)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, case)| (id.to_lowercase(), case))
                .collect(),
        }
    }

    /// Case-insensitive lookup. Returns the canonical identifier with the case.
    pub fn lookup(&self, identifier: &str) -> Option<(&str, &PatientCase)> {
        let key = identifier.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(id, _)| *id == key)
            .map(|(id, case)| (id.as_str(), case))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn entries(&self) -> &[(String, PatientCase)] {
        &self.entries
    }
}

impl Default for PatientDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
