//! Process configuration, read from the environment.
//!
//! `.env.local` and `.env` in the working directory are loaded first; values
//! already present in the environment win.

use std::fmt;
use std::path::PathBuf;

use crate::error::CaseError;
use crate::models::AmbientContext;
use crate::retrieval::{openai, KnowledgeSource, OpenAiConfig};
use crate::speech::AmbientLibrary;
use crate::workflow::WorkflowDefinition;

pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS_JSON";
pub const ENV_OUTPUT_DIR: &str = "MEDASSIST_OUTPUT_DIR";
pub const ENV_AMBIENT_DIR: &str = "MEDASSIST_AMBIENT_DIR";
pub const ENV_AMBIENT_HOSPITAL: &str = "MEDASSIST_AMBIENT_HOSPITAL";
pub const ENV_AMBIENT_AIRPORT: &str = "MEDASSIST_AMBIENT_AIRPORT";
pub const ENV_KNOWLEDGE_DIR: &str = "MEDASSIST_KNOWLEDGE_DIR";
pub const ENV_WORKFLOW: &str = "MEDASSIST_WORKFLOW";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_CHAT_MODEL: &str = "OPENAI_CHAT_MODEL";
pub const ENV_OPENAI_EMBEDDING_MODEL: &str = "OPENAI_EMBEDDING_MODEL";

pub const DEFAULT_OUTPUT_DIR: &str = "case_runs";

#[derive(Clone)]
pub struct AppConfig {
    /// Service-account JSON for the speech service
    pub credentials_json: String,
    /// Root under which each run gets its own workspace
    pub output_dir: PathBuf,
    pub ambient_dir: PathBuf,
    pub ambient_hospital: Option<PathBuf>,
    pub ambient_airport: Option<PathBuf>,
    pub knowledge_dir: Option<PathBuf>,
    pub workflow_path: Option<PathBuf>,
    pub openai: OpenAiConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("credentials_json", &"[REDACTED]")
            .field("output_dir", &self.output_dir)
            .field("ambient_dir", &self.ambient_dir)
            .field("ambient_hospital", &self.ambient_hospital)
            .field("ambient_airport", &self.ambient_airport)
            .field("knowledge_dir", &self.knowledge_dir)
            .field("workflow_path", &self.workflow_path)
            .field("openai", &self.openai)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env` files, then read the process environment.
    pub fn from_env() -> Result<Self, CaseError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CaseError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials_json = get(ENV_CREDENTIALS).ok_or_else(|| {
            CaseError::MissingCredential(format!("{} is not set", ENV_CREDENTIALS))
        })?;

        let openai = OpenAiConfig {
            base_url: get(ENV_OPENAI_BASE_URL).unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
            api_key: get(ENV_OPENAI_API_KEY).unwrap_or_default(),
            chat_model: get(ENV_OPENAI_CHAT_MODEL)
                .unwrap_or_else(|| openai::DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get(ENV_OPENAI_EMBEDDING_MODEL)
                .unwrap_or_else(|| openai::DEFAULT_EMBEDDING_MODEL.to_string()),
        };

        Ok(Self {
            credentials_json,
            output_dir: get(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            ambient_dir: get(ENV_AMBIENT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            ambient_hospital: get(ENV_AMBIENT_HOSPITAL).map(PathBuf::from),
            ambient_airport: get(ENV_AMBIENT_AIRPORT).map(PathBuf::from),
            knowledge_dir: get(ENV_KNOWLEDGE_DIR).map(PathBuf::from),
            workflow_path: get(ENV_WORKFLOW).map(PathBuf::from),
            openai,
        })
    }

    /// Ambient beds from the ambient directory, with per-bed overrides.
    pub fn ambient_library(&self) -> AmbientLibrary {
        let mut library = AmbientLibrary::from_dir(&self.ambient_dir);
        if let Some(ref path) = self.ambient_hospital {
            library = library.with_bed(AmbientContext::Hospital, path);
        }
        if let Some(ref path) = self.ambient_airport {
            library = library.with_bed(AmbientContext::Airport, path);
        }
        library
    }

    pub fn knowledge_source(&self) -> KnowledgeSource {
        match self.knowledge_dir {
            Some(ref dir) => KnowledgeSource::from_dir(dir),
            None => KnowledgeSource::builtin(),
        }
    }

    /// The configured workflow file, or the built-in MedAssist chain.
    pub fn workflow(&self) -> Result<WorkflowDefinition, CaseError> {
        match self.workflow_path {
            Some(ref path) => WorkflowDefinition::from_file(path),
            None => Ok(WorkflowDefinition::medassist()),
        }
    }
}

/// Load `.env.local` (higher priority), then `.env`, from the working
/// directory. Existing variables are never overridden.
pub fn load_dotenv() {
    for filename in &[".env.local", ".env"] {
        let path = std::path::Path::new(filename);
        if !path.exists() {
            continue;
        }
        if let Ok(content) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&content) {
                if std::env::var(&key).is_err() {
                    std::env::set_var(&key, &value);
                }
            }
            tracing::info!("[Config] Loaded environment from '{}'", filename);
        }
    }
}

/// `KEY=VALUE` lines; comments, blanks and malformed lines are skipped.
/// Surrounding single or double quotes are stripped.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some(eq_idx) = line.find('=') {
            let key = line[..eq_idx].trim();
            if key.is_empty() {
                continue;
            }
            let mut value = line[eq_idx + 1..].trim();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}
